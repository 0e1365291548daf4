//! Turn rotation and round lifecycle.
//!
//! `TurnController` is stateless: every function takes the room it works
//! on and returns the events the transition produced, paired with their
//! recipients. Nothing here locks or sends; the session layer does both.

use rand::Rng;
use rand::seq::IndexedRandom;
use sketchwire_protocol::{Dispatch, GameEvent};
use tokio::time::Instant;

use crate::words::FALLBACK_WORD;
use crate::{Room, RoomState};

/// Character shown in place of each letter of the secret word.
pub const MASK_CHAR: char = '_';

/// Round lifecycle rules.
pub struct TurnController;

impl TurnController {
    /// Index of the player who draws next.
    ///
    /// Round-robin by current list position: the player after the outgoing
    /// drawer, wrapping around. If there was no drawer, or the drawer has
    /// left, rotation restarts at the head of the list.
    pub fn next_drawer_index(room: &Room) -> usize {
        let found = room
            .current_drawer
            .and_then(|handle| room.position_of(handle));
        match found {
            Some(index) if !room.players.is_empty() => (index + 1) % room.players.len(),
            _ => 0,
        }
    }

    /// Starts a new round.
    ///
    /// The caller must have checked that the room has at least
    /// `min_players`; with an empty room this returns no events and leaves
    /// the room untouched.
    ///
    /// Returns two dispatches: `YourTurn` (with the plaintext word) to the
    /// drawer only, and `RoundStarted` (masked) to everyone else.
    pub fn start_round<R: Rng + ?Sized>(
        room: &mut Room,
        rng: &mut R,
        now: Instant,
    ) -> Vec<Dispatch> {
        if room.players.is_empty() {
            tracing::warn!(room = %room.code, "start_round called on an empty room");
            return Vec::new();
        }

        let next = Self::next_drawer_index(room);

        for player in &mut room.players {
            player.has_guessed_correctly = false;
            player.is_drawing = false;
        }

        let drawer = &mut room.players[next];
        drawer.is_drawing = true;
        let drawer_handle = drawer.connection_handle;
        let drawer_name = drawer.display_name.clone();
        room.current_drawer = Some(drawer_handle);

        room.secret_word = room
            .word_pool
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| FALLBACK_WORD.to_string());

        room.round_started_at = Some(now);
        room.round_number += 1;
        room.state = RoomState::Drawing;

        tracing::info!(
            room = %room.code,
            round = room.round_number,
            drawer = %drawer_name,
            "round started"
        );

        let duration_secs = room.round_duration.as_secs();
        vec![
            Dispatch::to(
                drawer_handle,
                GameEvent::YourTurn {
                    word: room.secret_word.clone(),
                    round_number: room.round_number,
                    duration_secs,
                },
            ),
            Dispatch::room_except(
                &room.code,
                drawer_handle,
                GameEvent::RoundStarted {
                    drawer: drawer_name,
                    masked_word: Self::masked_word(room),
                    word_length: room.secret_word.chars().count(),
                    round_number: room.round_number,
                    duration_secs,
                },
            ),
        ]
    }

    /// Ends the running round and reveals the word.
    ///
    /// Only a room in `Drawing` can end; any other state yields no events.
    /// Scores and the drawer flag are left alone; the next
    /// [`start_round`](Self::start_round) resets the round flags.
    pub fn end_round(room: &mut Room) -> Vec<Dispatch> {
        if !room.state.can_transition_to(RoomState::RoundEnd) {
            return Vec::new();
        }
        room.state = RoomState::RoundEnd;

        tracing::info!(
            room = %room.code,
            round = room.round_number,
            word = %room.secret_word,
            "round ended"
        );

        vec![Dispatch::room(
            &room.code,
            GameEvent::RoundEnded {
                word: room.secret_word.clone(),
                round_number: room.round_number,
                standings: room.standings(),
            },
        )]
    }

    /// The secret word with every character replaced by [`MASK_CHAR`].
    ///
    /// Spaces are masked like letters, so `"ice cream"` becomes nine
    /// underscores.
    pub fn masked_word(room: &Room) -> String {
        room.secret_word.chars().map(|_| MASK_CHAR).collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use sketchwire_protocol::{ConnectionHandle, Recipient, RoomCode};

    use super::*;
    use crate::RoomConfig;

    fn h(id: u64) -> ConnectionHandle {
        ConnectionHandle(id)
    }

    fn room_with(names: &[&str]) -> Room {
        let mut room = Room::new(RoomCode::new("turn01"), &RoomConfig::default());
        for (i, name) in names.iter().enumerate() {
            room.admit(h(i as u64 + 1), name);
        }
        room
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_first_round_picks_head_of_list() {
        let mut room = room_with(&["Alice", "Bob"]);
        TurnController::start_round(&mut room, &mut rng(), Instant::now());

        assert_eq!(room.state(), RoomState::Drawing);
        assert_eq!(room.round_number(), 1);
        assert_eq!(room.current_drawer(), Some(h(1)));
        assert!(room.players()[0].is_drawing());
        assert_eq!(room.drawer_count(), 1);
    }

    #[test]
    fn test_rotation_wraps_around() {
        let mut room = room_with(&["Alice", "Bob", "Cara"]);
        let mut rng = rng();
        let mut drawers = Vec::new();
        for _ in 0..4 {
            TurnController::start_round(&mut room, &mut rng, Instant::now());
            drawers.push(room.drawer().unwrap().display_name().to_string());
        }
        assert_eq!(drawers, ["Alice", "Bob", "Cara", "Alice"]);
    }

    #[test]
    fn test_rotation_restarts_when_drawer_left() {
        let mut room = room_with(&["Alice", "Bob", "Cara"]);
        let mut rng = rng();
        TurnController::start_round(&mut room, &mut rng, Instant::now());
        TurnController::start_round(&mut room, &mut rng, Instant::now());
        // Bob is drawing; he leaves.
        room.remove_player(h(2));

        assert_eq!(TurnController::next_drawer_index(&room), 0);
        TurnController::start_round(&mut room, &mut rng, Instant::now());
        assert_eq!(room.drawer().unwrap().display_name(), "Alice");
    }

    #[test]
    fn test_start_round_resets_guess_flags() {
        let mut room = room_with(&["Alice", "Bob"]);
        room.players[1].has_guessed_correctly = true;
        TurnController::start_round(&mut room, &mut rng(), Instant::now());
        assert!(room.players().iter().all(|p| !p.has_guessed_correctly()));
    }

    #[test]
    fn test_start_round_word_comes_from_pool() {
        let mut room = room_with(&["Alice", "Bob"]);
        room.word_pool = vec!["pizza".into()];
        TurnController::start_round(&mut room, &mut rng(), Instant::now());
        assert_eq!(room.secret_word(), "pizza");
    }

    #[test]
    fn test_empty_pool_falls_back() {
        let mut room = room_with(&["Alice", "Bob"]);
        room.word_pool.clear();
        TurnController::start_round(&mut room, &mut rng(), Instant::now());
        assert_eq!(room.secret_word(), FALLBACK_WORD);
    }

    #[test]
    fn test_word_only_reaches_drawer() {
        let mut room = room_with(&["Alice", "Bob", "Cara"]);
        room.word_pool = vec!["pizza".into()];
        let dispatches =
            TurnController::start_round(&mut room, &mut rng(), Instant::now());

        assert_eq!(dispatches.len(), 2);
        assert_eq!(dispatches[0].recipient, Recipient::Connection(h(1)));
        assert!(matches!(
            &dispatches[0].event,
            GameEvent::YourTurn { word, duration_secs: 80, .. } if word == "pizza"
        ));

        assert_eq!(
            dispatches[1].recipient,
            Recipient::RoomExcept(RoomCode::new("TURN01"), h(1))
        );
        match &dispatches[1].event {
            GameEvent::RoundStarted {
                drawer,
                masked_word,
                word_length,
                ..
            } => {
                assert_eq!(drawer, "Alice");
                assert_eq!(masked_word, "_____");
                assert_eq!(*word_length, 5);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_end_round_reveals_word_and_standings() {
        let mut room = room_with(&["Alice", "Bob"]);
        room.word_pool = vec!["pizza".into()];
        TurnController::start_round(&mut room, &mut rng(), Instant::now());
        room.players[1].award(175);

        let dispatches = TurnController::end_round(&mut room);

        assert_eq!(room.state(), RoomState::RoundEnd);
        assert_eq!(dispatches.len(), 1);
        match &dispatches[0].event {
            GameEvent::RoundEnded {
                word, standings, ..
            } => {
                assert_eq!(word, "pizza");
                assert_eq!(standings[0].name, "Bob");
                assert_eq!(standings[0].score, 175);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        // Scores are untouched, drawer flag survives until next start.
        assert_eq!(room.players()[1].score(), 175);
        assert_eq!(room.drawer_count(), 1);
    }

    #[test]
    fn test_end_round_outside_drawing_is_noop() {
        let mut room = room_with(&["Alice", "Bob"]);
        assert!(TurnController::end_round(&mut room).is_empty());
        assert_eq!(room.state(), RoomState::Waiting);
    }

    #[test]
    fn test_masked_word_preserves_length() {
        let mut room = room_with(&["Alice"]);
        room.secret_word = "pizza".into();
        assert_eq!(TurnController::masked_word(&room), "_____");
        room.secret_word = "ice cream".into();
        assert_eq!(TurnController::masked_word(&room), "_________");
    }
}
