//! Guess evaluation and time-decayed scoring.

use std::time::Duration;

use sketchwire_protocol::ConnectionHandle;
use tokio::time::Instant;

use crate::Room;

/// Points for any correct guess, before the time bonus.
pub const BASE_POINTS: u32 = 100;

/// Result of evaluating one guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessVerdict {
    /// The guess matched. `score` is the player's new total.
    Correct { awarded: u32, score: u32 },
    /// No match, or the sender was not eligible to guess.
    Incorrect,
}

impl GuessVerdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct { .. })
    }
}

/// Guess rules. Knows about scoring, not about when rounds end; the
/// session layer asks [`everyone_guessed`](Self::everyone_guessed) and
/// decides.
pub struct GuessEvaluator;

impl GuessEvaluator {
    /// Evaluates `raw` from `handle` against the room's secret word.
    ///
    /// Ineligible senders get `Incorrect` rather than an error: the player
    /// is unknown, is the drawer, already guessed this round, or no round
    /// is running.
    pub fn check_guess(
        room: &mut Room,
        handle: ConnectionHandle,
        raw: &str,
        now: Instant,
    ) -> GuessVerdict {
        if !room.state.is_round_active() {
            return GuessVerdict::Incorrect;
        }
        let started = room.round_started_at.unwrap_or(now);
        let duration = room.round_duration;
        let matched = Self::matches(&room.secret_word, raw);

        let Some(player) = room
            .players
            .iter_mut()
            .find(|p| p.connection_handle == handle)
        else {
            return GuessVerdict::Incorrect;
        };
        if player.is_drawing || player.has_guessed_correctly || !matched {
            return GuessVerdict::Incorrect;
        }

        let awarded = Self::points_for(now.saturating_duration_since(started), duration);
        player.has_guessed_correctly = true;
        player.award(awarded);

        tracing::info!(
            room = %room.code,
            name = %player.display_name,
            awarded,
            score = player.score,
            "correct guess"
        );

        GuessVerdict::Correct {
            awarded,
            score: player.score,
        }
    }

    /// Trimmed, case-insensitive, whole-string equality.
    pub fn matches(secret: &str, raw: &str) -> bool {
        !secret.is_empty() && raw.trim().to_lowercase() == secret.to_lowercase()
    }

    /// `100 + max(0, duration - floor(elapsed))`, all in seconds.
    pub fn points_for(elapsed: Duration, round_duration: Duration) -> u32 {
        let bonus = round_duration
            .as_secs()
            .saturating_sub(elapsed.as_secs());
        BASE_POINTS.saturating_add(u32::try_from(bonus).unwrap_or(u32::MAX))
    }

    /// `true` when every non-drawing player has guessed this round.
    ///
    /// Vacuously true when the drawer is alone.
    pub fn everyone_guessed(room: &Room) -> bool {
        room.players
            .iter()
            .filter(|p| !p.is_drawing)
            .all(|p| p.has_guessed_correctly)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sketchwire_protocol::RoomCode;

    use super::*;
    use crate::{RoomConfig, TurnController};

    fn h(id: u64) -> ConnectionHandle {
        ConnectionHandle(id)
    }

    /// Alice draws "pizza", Bob and Cara guess. Returns the room and the
    /// round start instant.
    fn pizza_round() -> (Room, Instant) {
        let config = RoomConfig {
            word_pool: vec!["pizza".into()],
            ..RoomConfig::default()
        };
        let mut room = Room::new(RoomCode::new("guess1"), &config);
        room.admit(h(1), "Alice");
        room.admit(h(2), "Bob");
        room.admit(h(3), "Cara");
        let start = Instant::now();
        TurnController::start_round(&mut room, &mut StdRng::seed_from_u64(1), start);
        (room, start)
    }

    #[test]
    fn test_matches_trims_and_ignores_case() {
        assert!(GuessEvaluator::matches("pizza", " Pizza "));
        assert!(GuessEvaluator::matches("pizza", "PIZZA"));
        assert!(GuessEvaluator::matches("pizza", "pizza"));
        assert!(!GuessEvaluator::matches("pizza", "pizzas"));
        assert!(!GuessEvaluator::matches("pizza", "piz"));
    }

    #[test]
    fn test_empty_secret_never_matches() {
        assert!(!GuessEvaluator::matches("", ""));
        assert!(!GuessEvaluator::matches("", "   "));
    }

    #[test]
    fn test_points_decay_and_floor() {
        let d = Duration::from_secs(80);
        assert_eq!(GuessEvaluator::points_for(Duration::from_secs(10), d), 170);
        assert_eq!(GuessEvaluator::points_for(Duration::from_secs(5), d), 175);
        assert_eq!(GuessEvaluator::points_for(Duration::from_millis(10_900), d), 170);
        assert_eq!(GuessEvaluator::points_for(Duration::from_secs(80), d), 100);
        assert_eq!(GuessEvaluator::points_for(Duration::from_secs(95), d), 100);
    }

    #[test]
    fn test_correct_guess_scores_once() {
        let (mut room, start) = pizza_round();
        let now = start + Duration::from_secs(10);

        let first = GuessEvaluator::check_guess(&mut room, h(2), "Pizza", now);
        assert_eq!(
            first,
            GuessVerdict::Correct {
                awarded: 170,
                score: 170
            }
        );

        let again = GuessEvaluator::check_guess(&mut room, h(2), "pizza", now);
        assert_eq!(again, GuessVerdict::Incorrect);
        assert_eq!(room.player(h(2)).unwrap().score(), 170);
    }

    #[test]
    fn test_drawer_cannot_guess() {
        let (mut room, start) = pizza_round();
        let verdict = GuessEvaluator::check_guess(&mut room, h(1), "pizza", start);
        assert_eq!(verdict, GuessVerdict::Incorrect);
        assert_eq!(room.player(h(1)).unwrap().score(), 0);
    }

    #[test]
    fn test_unknown_player_is_incorrect() {
        let (mut room, start) = pizza_round();
        let verdict = GuessEvaluator::check_guess(&mut room, h(99), "pizza", start);
        assert_eq!(verdict, GuessVerdict::Incorrect);
    }

    #[test]
    fn test_wrong_guess_leaves_player_untouched() {
        let (mut room, start) = pizza_round();
        let verdict = GuessEvaluator::check_guess(&mut room, h(2), "pasta", start);
        assert_eq!(verdict, GuessVerdict::Incorrect);
        assert!(!room.player(h(2)).unwrap().has_guessed_correctly());
    }

    #[test]
    fn test_no_scoring_after_round_end() {
        let (mut room, start) = pizza_round();
        TurnController::end_round(&mut room);
        let verdict = GuessEvaluator::check_guess(&mut room, h(2), "pizza", start);
        assert_eq!(verdict, GuessVerdict::Incorrect);
    }

    #[test]
    fn test_everyone_guessed_ignores_drawer() {
        let (mut room, start) = pizza_round();
        assert!(!GuessEvaluator::everyone_guessed(&room));
        GuessEvaluator::check_guess(&mut room, h(2), "pizza", start);
        assert!(!GuessEvaluator::everyone_guessed(&room));
        GuessEvaluator::check_guess(&mut room, h(3), "pizza", start);
        assert!(GuessEvaluator::everyone_guessed(&room));
    }
}
