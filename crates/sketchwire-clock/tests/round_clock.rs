//! Integration tests for the round clock.
//!
//! Every test runs on a paused Tokio clock; sleeping in the test body
//! auto-advances time and lets the timer tasks run.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sketchwire_clock::{Alarm, AlarmHandler, AlarmKind, RoundClock};
use sketchwire_protocol::RoomCode;

// =========================================================================
// Helpers
// =========================================================================

#[derive(Default)]
struct Recorder {
    fired: Mutex<Vec<Alarm>>,
}

impl Recorder {
    fn fired(&self) -> Vec<Alarm> {
        self.fired.lock().unwrap().clone()
    }
}

impl AlarmHandler for Recorder {
    async fn on_alarm(&self, alarm: Alarm) {
        self.fired.lock().unwrap().push(alarm);
    }
}

/// Handler that owns its clock, the way the server does, and schedules
/// the next round from inside the expiry callback.
struct Chain {
    clock: RoundClock<Chain>,
    fired: Mutex<Vec<Alarm>>,
}

impl AlarmHandler for Chain {
    async fn on_alarm(&self, alarm: Alarm) {
        if alarm.kind == AlarmKind::RoundExpired {
            self.clock.arm(
                Alarm::next_round(alarm.code.clone(), alarm.round),
                Duration::from_secs(5),
            );
        }
        self.fired.lock().unwrap().push(alarm);
    }
}

fn room(code: &str) -> RoomCode {
    RoomCode::new(code)
}

fn setup() -> (Arc<Recorder>, RoundClock<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let clock = RoundClock::new(Arc::downgrade(&recorder));
    (recorder, clock)
}

async fn sleep_secs(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_alarm_fires_after_delay() {
    let (recorder, clock) = setup();
    clock.arm(Alarm::round_expired(room("AAAAAA"), 1), Duration::from_secs(80));
    assert_eq!(clock.pending(), 1);

    sleep_secs(79).await;
    assert!(recorder.fired().is_empty());

    sleep_secs(2).await;
    assert_eq!(
        recorder.fired(),
        vec![Alarm::round_expired(room("AAAAAA"), 1)]
    );
    assert_eq!(clock.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_zero_delay_fires() {
    let (recorder, clock) = setup();
    clock.arm(Alarm::next_round(room("AAAAAA"), 3), Duration::ZERO);

    sleep_secs(1).await;
    assert_eq!(recorder.fired().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_rooms_are_independent() {
    let (recorder, clock) = setup();
    clock.arm(Alarm::round_expired(room("AAAAAA"), 1), Duration::from_secs(10));
    clock.arm(Alarm::round_expired(room("BBBBBB"), 4), Duration::from_secs(20));
    assert_eq!(clock.pending(), 2);

    sleep_secs(15).await;
    assert_eq!(recorder.fired().len(), 1);
    assert_eq!(recorder.fired()[0].code, room("AAAAAA"));

    sleep_secs(10).await;
    assert_eq!(recorder.fired().len(), 2);
    assert_eq!(recorder.fired()[1].round, 4);
}

// =========================================================================
// Replacing and cancelling
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rearm_replaces_pending_alarm() {
    let (recorder, clock) = setup();
    let code = room("AAAAAA");
    clock.arm(Alarm::round_expired(code.clone(), 1), Duration::from_secs(80));

    sleep_secs(10).await;
    // The round ended early: switch to the intermission alarm.
    clock.arm(Alarm::next_round(code.clone(), 1), Duration::from_secs(5));
    assert_eq!(clock.pending(), 1);
    let (pending, _) = clock.pending_for(&code).unwrap();
    assert_eq!(pending.kind, AlarmKind::NextRound);

    sleep_secs(100).await;
    assert_eq!(recorder.fired(), vec![Alarm::next_round(code, 1)]);
}

#[tokio::test(start_paused = true)]
async fn test_stale_alarm_does_not_replace_newer_one() {
    let (recorder, clock) = setup();
    let code = room("AAAAAA");
    clock.arm(Alarm::round_expired(code.clone(), 2), Duration::from_secs(80));

    // A late intermission alarm for round 1 must not cancel round 2's expiry.
    assert!(!clock.arm(Alarm::next_round(code.clone(), 1), Duration::from_secs(5)));
    assert_eq!(clock.pending_for(&code).unwrap().0.round, 2);

    sleep_secs(81).await;
    assert_eq!(recorder.fired(), vec![Alarm::round_expired(code, 2)]);
}

#[test]
fn test_alarm_ordering() {
    let code = room("AAAAAA");
    let expired_1 = Alarm::round_expired(code.clone(), 1);
    let next_1 = Alarm::next_round(code.clone(), 1);
    let expired_2 = Alarm::round_expired(code, 2);

    assert!(expired_1.precedes(&next_1));
    assert!(next_1.precedes(&expired_2));
    assert!(!expired_2.precedes(&next_1));
    assert!(!next_1.precedes(&next_1));
}

#[tokio::test(start_paused = true)]
async fn test_disarm_cancels() {
    let (recorder, clock) = setup();
    let code = room("AAAAAA");
    clock.arm(Alarm::round_expired(code.clone(), 1), Duration::from_secs(10));

    assert!(clock.disarm(&code));
    assert!(!clock.disarm(&code));
    assert!(clock.pending_for(&code).is_none());

    sleep_secs(20).await;
    assert!(recorder.fired().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_disarm_through_spares_later_rounds() {
    let (recorder, clock) = setup();
    let code = room("AAAAAA");
    clock.arm(Alarm::round_expired(code.clone(), 3), Duration::from_secs(10));

    // Round 2 ending late must not cancel round 3's expiry.
    assert!(!clock.disarm_through(&code, 2));
    assert_eq!(clock.pending_for(&code).unwrap().0.round, 3);

    sleep_secs(11).await;
    assert_eq!(recorder.fired(), vec![Alarm::round_expired(code.clone(), 3)]);
}

#[tokio::test(start_paused = true)]
async fn test_disarm_through_cancels_current_round() {
    let (recorder, clock) = setup();
    let code = room("AAAAAA");
    clock.arm(Alarm::round_expired(code.clone(), 3), Duration::from_secs(10));

    assert!(clock.disarm_through(&code, 3));
    assert!(clock.pending_for(&code).is_none());

    sleep_secs(20).await;
    assert!(recorder.fired().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pending_for_reports_deadline() {
    let (_recorder, clock) = setup();
    let code = room("AAAAAA");
    let armed_at = tokio::time::Instant::now();
    clock.arm(Alarm::round_expired(code.clone(), 2), Duration::from_secs(30));

    let (alarm, deadline) = clock.pending_for(&code).unwrap();
    assert_eq!(alarm.round, 2);
    assert_eq!(deadline - armed_at, Duration::from_secs(30));
}

// =========================================================================
// Handler lifetime
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_handler_can_rearm_its_own_room() {
    let chain = Arc::new_cyclic(|weak| Chain {
        clock: RoundClock::new(weak.clone()),
        fired: Mutex::new(Vec::new()),
    });
    let code = room("CCCCCC");
    chain
        .clock
        .arm(Alarm::round_expired(code.clone(), 1), Duration::from_secs(80));

    sleep_secs(81).await;
    assert_eq!(chain.clock.pending(), 1, "intermission alarm armed");

    sleep_secs(5).await;
    let fired = chain.fired.lock().unwrap().clone();
    assert_eq!(
        fired,
        vec![
            Alarm::round_expired(code.clone(), 1),
            Alarm::next_round(code, 1),
        ]
    );
    assert_eq!(chain.clock.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_alarm_after_handler_dropped_is_harmless() {
    let (recorder, clock) = setup();
    clock.arm(Alarm::round_expired(room("AAAAAA"), 1), Duration::from_secs(1));
    drop(recorder);

    sleep_secs(2).await;
    assert_eq!(clock.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_clock_cancels_timers() {
    let (recorder, clock) = setup();
    clock.arm(Alarm::round_expired(room("AAAAAA"), 1), Duration::from_secs(1));
    drop(clock);

    sleep_secs(2).await;
    assert!(recorder.fired().is_empty());
}
