//! Per-room round timers for Sketchwire.
//!
//! Rooms do not run a game loop. The only time-driven behavior is "end
//! this round when its duration runs out" and "start the next round after
//! a short intermission", so each room needs at most one pending alarm.
//!
//! # Integration
//!
//! The clock is owned by the thing that handles its alarms, and holds only
//! a weak reference back to it:
//!
//! ```ignore
//! let state = Arc::new_cyclic(|weak| ServerState {
//!     clock: RoundClock::new(weak.clone()),
//!     ..
//! });
//! state.clock.arm(Alarm::round_expired(code, 1), Duration::from_secs(80));
//! ```
//!
//! Arming a room replaces whatever alarm it had. A handler may re-arm its
//! own room from inside `on_alarm`.

use std::future::Future;
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sketchwire_protocol::RoomCode;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Alarms
// ---------------------------------------------------------------------------

/// What should happen when an alarm fires.
///
/// Variants are declared in lifecycle order: within one round the expiry
/// comes before the intermission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlarmKind {
    /// The round ran out of time.
    RoundExpired,
    /// The intermission after a round is over.
    NextRound,
}

/// A scheduled callback for one room, tagged with the round it belongs to
/// so a handler can tell a stale alarm from a current one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    pub code: RoomCode,
    pub round: u32,
    pub kind: AlarmKind,
}

impl Alarm {
    pub fn round_expired(code: RoomCode, round: u32) -> Self {
        Self {
            code,
            round,
            kind: AlarmKind::RoundExpired,
        }
    }

    pub fn next_round(code: RoomCode, round: u32) -> Self {
        Self {
            code,
            round,
            kind: AlarmKind::NextRound,
        }
    }

    /// `true` if `self` belongs to an earlier point of the room's
    /// lifecycle than `other`.
    pub fn precedes(&self, other: &Alarm) -> bool {
        (self.round, self.kind) < (other.round, other.kind)
    }
}

/// Receives fired alarms.
pub trait AlarmHandler: Send + Sync + 'static {
    fn on_alarm(&self, alarm: Alarm) -> impl Future<Output = ()> + Send;
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

struct Timer {
    generation: u64,
    alarm: Alarm,
    deadline: Instant,
    task: AbortHandle,
}

/// One pending alarm per room, each backed by a sleeping Tokio task.
pub struct RoundClock<H> {
    handler: Weak<H>,
    timers: Arc<DashMap<RoomCode, Timer>>,
    next_generation: AtomicU64,
}

impl<H: AlarmHandler> RoundClock<H> {
    /// Create a clock that delivers to `handler` for as long as it lives.
    pub fn new(handler: Weak<H>) -> Self {
        Self {
            handler,
            timers: Arc::new(DashMap::new()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Fire `alarm` after `delay`, replacing the room's pending alarm.
    ///
    /// An alarm that [precedes](Alarm::precedes) the one already pending
    /// is stale and is dropped; returns `false` in that case. Must be
    /// called from within a Tokio runtime.
    pub fn arm(&self, alarm: Alarm, delay: Duration) -> bool {
        // The entry stays locked until the timer is stored, so even a
        // zero-delay task cannot look for its slot before it exists.
        let entry = self.timers.entry(alarm.code.clone());
        if let Entry::Occupied(slot) = &entry {
            if alarm.precedes(&slot.get().alarm) {
                debug!(
                    room = %alarm.code,
                    round = alarm.round,
                    kind = ?alarm.kind,
                    "stale alarm ignored"
                );
                return false;
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let deadline = Instant::now() + delay;
        let task = self.spawn_timer(alarm.clone(), generation, deadline);
        let timer = Timer {
            generation,
            alarm,
            deadline,
            task,
        };

        debug!(
            room = %timer.alarm.code,
            round = timer.alarm.round,
            kind = ?timer.alarm.kind,
            delay_ms = delay.as_millis() as u64,
            "alarm armed"
        );

        match entry {
            Entry::Occupied(mut slot) => {
                let old = slot.insert(timer);
                old.task.abort();
                trace!(room = %old.alarm.code, kind = ?old.alarm.kind, "alarm replaced");
            }
            Entry::Vacant(slot) => {
                slot.insert(timer);
            }
        }
        true
    }

    /// Cancel the room's pending alarm. Returns `true` if one was pending.
    pub fn disarm(&self, code: &RoomCode) -> bool {
        match self.timers.remove(code) {
            Some((_, timer)) => {
                timer.task.abort();
                debug!(room = %code, kind = ?timer.alarm.kind, "alarm disarmed");
                true
            }
            None => false,
        }
    }

    /// Cancel the room's pending alarm if it belongs to `round` or an
    /// earlier one. An alarm for a later round is left alone.
    pub fn disarm_through(&self, code: &RoomCode, round: u32) -> bool {
        match self.timers.remove_if(code, |_, timer| timer.alarm.round <= round) {
            Some((_, timer)) => {
                timer.task.abort();
                debug!(room = %code, round, kind = ?timer.alarm.kind, "alarm disarmed");
                true
            }
            None => false,
        }
    }

    /// The room's pending alarm and when it fires.
    pub fn pending_for(&self, code: &RoomCode) -> Option<(Alarm, Instant)> {
        self.timers
            .get(code)
            .map(|timer| (timer.alarm.clone(), timer.deadline))
    }

    /// Number of rooms with a pending alarm.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    fn spawn_timer(&self, alarm: Alarm, generation: u64, deadline: Instant) -> AbortHandle {
        let handler = self.handler.clone();
        let timers = Arc::clone(&self.timers);

        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;

            // Claim the slot. A newer arm() or a disarm() already owns it
            // if the generation moved on.
            let claimed = timers
                .remove_if(&alarm.code, |_, timer| timer.generation == generation)
                .is_some();
            if !claimed {
                return;
            }

            let Some(handler) = handler.upgrade() else {
                trace!(room = %alarm.code, "alarm fired after handler dropped");
                return;
            };
            debug!(room = %alarm.code, round = alarm.round, kind = ?alarm.kind, "alarm fired");
            handler.on_alarm(alarm).await;
        });
        task.abort_handle()
    }
}

impl<H> Drop for RoundClock<H> {
    fn drop(&mut self) {
        for timer in self.timers.iter() {
            timer.task.abort();
        }
    }
}
