//! The session coordinator: every externally visible game operation.
//!
//! Each public method follows the same shape:
//!
//! 1. Look the room up in the registry (shard lock held only for the
//!    lookup).
//! 2. Take that room's mutex and hold it for the rest of the operation.
//! 3. Apply the rules from `sketchwire-room`, append chat, and build the
//!    events, all under the same lock.
//! 4. Return an [`Outcome`]; the caller delivers it.
//!
//! Nothing awaits while the room lock is held, so two operations on the
//! same room are linearizable and operations on different rooms never
//! contend.

use std::sync::Arc;

use sketchwire_protocol::{
    ChatEntry, ConnectionHandle, Dispatch, GameEvent, RoomCode, RoomSummary,
    StrokePayload,
};
use sketchwire_room::{
    Admission, GuessEvaluator, GuessVerdict, Room, RoomError, RoomRegistry,
    SharedRoom, TurnController, generate_room_code,
};
use tokio::sync::OwnedMutexGuard;
use tokio::time::Instant;

use crate::{Joined, Outcome, Rejection, SessionError, Transition};

/// Longest accepted display name, in characters.
pub const MAX_NAME_CHARS: usize = 24;

type RoomGuard = OwnedMutexGuard<Room>;

/// The façade the transport edge calls.
///
/// Holds an injected [`RoomRegistry`]; two coordinators built from two
/// registries are completely independent, which is what tests rely on.
pub struct SessionCoordinator {
    registry: Arc<RoomRegistry>,
}

impl SessionCoordinator {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    // =====================================================================
    // Rooms
    // =====================================================================

    /// A random code. Not reserved; see [`create_room`](Self::create_room).
    pub fn generate_room_code(&self) -> RoomCode {
        generate_room_code()
    }

    /// Creates a room under a freshly generated, unused code.
    pub fn create_room(&self) -> RoomCode {
        loop {
            let code = generate_room_code();
            if self.registry.try_create(&code).is_some() {
                return code;
            }
            tracing::debug!(room = %code, "room code collision, retrying");
        }
    }

    /// Creates `code`, or returns the room already registered under it.
    pub fn create_room_with_code(&self, code: &RoomCode) -> SharedRoom {
        self.registry.create_room(code)
    }

    /// Removes `code` if nobody plays in it. Returns `true` if it was
    /// removed.
    pub async fn discard_if_empty(&self, code: &RoomCode) -> bool {
        let Ok((shared, mut room)) = self.lock_open(code).await else {
            return false;
        };
        if !room.is_empty() {
            return false;
        }
        room.close();
        self.registry.remove_instance(code, &shared)
    }

    pub fn get_room(&self, code: &RoomCode) -> Option<SharedRoom> {
        self.registry.get_room(code)
    }

    /// Summaries of every live room, ordered by code.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut summaries = Vec::new();
        for shared in self.registry.list_rooms() {
            let room = shared.lock().await;
            if !room.is_closed() {
                summaries.push(room.summary());
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    // =====================================================================
    // Join / leave
    // =====================================================================

    /// Adds a player to a room, or reconnects the player with that name.
    ///
    /// The caller gets a `Welcome` with the full room state (including the
    /// plaintext word if they are the drawer coming back). Everyone else
    /// gets `PlayerJoined` and a system chat line.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room does not exist
    /// - [`Rejection::EmptyName`] / [`Rejection::NameTooLong`] for bad names
    /// - [`Rejection::AlreadyInRoom`] if this connection already plays in
    ///   the room under a different name
    pub async fn join(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
        name: &str,
    ) -> Result<Joined, SessionError> {
        self.join_with(code, handle, name, |_| {}).await
    }

    /// [`join`](Self::join), running `admitted` before the room lock is
    /// released.
    ///
    /// Whatever `admitted` delivers reaches the new player ahead of the
    /// events of any later operation on the room, so the `Welcome`
    /// snapshot is never overtaken. `admitted` must not block.
    pub async fn join_with(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
        name: &str,
        admitted: impl FnOnce(&mut Joined),
    ) -> Result<Joined, SessionError> {
        let name = validate_name(name)?;
        let (_, mut room) = self.lock_open(code).await?;

        if let Some(existing) = room.player(handle) {
            if !existing.answers_to(name) {
                return Err(
                    Rejection::AlreadyInRoom(existing.display_name().to_string()).into(),
                );
            }
        }

        let admission = room.admit(handle, name);
        let index = admission.index();
        let (reconnected, replaced) = match admission {
            Admission::Joined { .. } => (false, None),
            Admission::Reconnected { replaced, .. } => {
                (true, (replaced != handle).then_some(replaced))
            }
        };

        let player = room.players()[index].clone();
        let display = player.display_name().to_string();
        let line = if reconnected {
            ChatEntry::system(format!("{display} reconnected"))
        } else {
            ChatEntry::system(format!("{display} joined"))
        };
        room.push_chat(line.clone());

        let players = room.player_views();
        let welcome = GameEvent::Welcome {
            code: room.code().clone(),
            you: players[index].clone(),
            players: players.clone(),
            chat: room.chat_history().to_vec(),
            phase: room.state().into(),
            round: room.round_view(handle, Instant::now()),
            reconnected,
        };

        let mut outcome = Outcome::none();
        outcome.push(Dispatch::to(handle, welcome));
        outcome.push(Dispatch::room_except(
            code,
            handle,
            GameEvent::PlayerJoined {
                name: display,
                players,
            },
        ));
        outcome.push(Dispatch::room_except(
            code,
            handle,
            GameEvent::Chat { entry: line },
        ));

        let mut joined = Joined {
            player,
            reconnected,
            replaced,
            outcome,
        };
        admitted(&mut joined);
        Ok(joined)
    }

    /// Removes the player on `handle`. Unknown room or player is a no-op.
    ///
    /// A departing drawer ends the round. The last player out closes the
    /// room and removes it from the registry before the lock is released.
    pub async fn leave(&self, code: &RoomCode, handle: ConnectionHandle) -> Outcome {
        let Ok((shared, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        let Some(player) = room.remove_player(handle) else {
            return Outcome::none();
        };

        let name = player.display_name().to_string();
        let line = ChatEntry::system(format!("{name} left"));
        room.push_chat(line.clone());

        let mut outcome = Outcome::none();
        if room.is_empty() {
            room.close();
            self.registry.remove_instance(code, &shared);
            tracing::info!(room = %code, "room closed");
            outcome.transition = Some(Transition::RoomClosed { code: code.clone() });
            return outcome;
        }

        outcome.push(Dispatch::room(
            code,
            GameEvent::PlayerLeft {
                name,
                players: room.player_views(),
            },
        ));
        outcome.push(Dispatch::room(code, GameEvent::Chat { entry: line }));

        if room.state().is_round_active()
            && (player.is_drawing() || GuessEvaluator::everyone_guessed(&room))
        {
            finish_round(&mut room, &mut outcome);
        }
        outcome
    }

    // =====================================================================
    // Rounds
    // =====================================================================

    /// Starts the next round: rotates the drawer and picks a word.
    ///
    /// # Errors
    /// - [`RoomError::NotFound`] if the room does not exist
    /// - [`Rejection::NotEnoughPlayers`] below the room's minimum
    ///
    /// On error the room is left exactly as it was.
    pub async fn start_round(&self, code: &RoomCode) -> Result<Outcome, SessionError> {
        let (_, mut room) = self.lock_open(code).await?;
        begin_round(&mut room)
    }

    /// Client-requested start. Only the host may start a round; anyone
    /// else is ignored.
    pub async fn request_start(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
    ) -> Result<Outcome, SessionError> {
        let (_, mut room) = self.lock_open(code).await?;
        if !room.is_host(handle) {
            tracing::debug!(room = %code, conn = %handle, "non-host start ignored");
            return Ok(Outcome::none());
        }
        begin_round(&mut room)
    }

    /// Ends the running round. No-op if the room is absent or idle.
    pub async fn end_round(&self, code: &RoomCode) -> Outcome {
        let Ok((_, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        let mut outcome = Outcome::none();
        finish_round(&mut room, &mut outcome);
        outcome
    }

    /// Client-requested end. Allowed for the drawer and the host.
    pub async fn request_end(&self, code: &RoomCode, handle: ConnectionHandle) -> Outcome {
        let Ok((_, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        let is_drawer = room.current_drawer() == Some(handle);
        if !is_drawer && !room.is_host(handle) {
            tracing::debug!(room = %code, conn = %handle, "unauthorized end ignored");
            return Outcome::none();
        }
        let mut outcome = Outcome::none();
        finish_round(&mut room, &mut outcome);
        outcome
    }

    /// Timer path: ends `round` if it is still the one running.
    ///
    /// A round that already ended (everyone guessed, drawer left) or was
    /// superseded must not be ended twice.
    pub async fn expire_round(&self, code: &RoomCode, round: u32) -> Outcome {
        let Ok((_, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        let mut outcome = Outcome::none();
        if room.state().is_round_active() && room.round_number() == round {
            tracing::debug!(room = %code, round, "round timer expired");
            finish_round(&mut room, &mut outcome);
        }
        outcome
    }

    /// Timer path: starts the round after `round` if the room is still
    /// sitting in that round's results.
    pub async fn advance_round(&self, code: &RoomCode, round: u32) -> Outcome {
        let Ok((_, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        if room.state() != sketchwire_room::RoomState::RoundEnd || room.round_number() != round {
            return Outcome::none();
        }
        match begin_round(&mut room) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::debug!(room = %code, error = %e, "auto-advance skipped");
                Outcome::none()
            }
        }
    }

    /// The masked secret word, or an empty string if the room is absent.
    pub async fn masked_word(&self, code: &RoomCode) -> String {
        match self.lock_open(code).await {
            Ok((_, room)) => TurnController::masked_word(&room),
            Err(_) => String::new(),
        }
    }

    // =====================================================================
    // Chat, guesses, drawing
    // =====================================================================

    /// A line of text from a player: a guess if they are eligible,
    /// otherwise plain chat.
    ///
    /// Correct guesses are never echoed as chat; the room sees a
    /// `CorrectGuess` event and a system line instead. If the guess leaves
    /// every non-drawer with the word, the round ends in the same step.
    pub async fn submit_text(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
        text: &str,
    ) -> Outcome {
        let Ok((_, mut room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        let text = text.trim();
        if text.is_empty() {
            return Outcome::none();
        }
        let Some(player) = room.player(handle) else {
            tracing::debug!(room = %code, conn = %handle, "chat from non-member dropped");
            return Outcome::none();
        };
        let name = player.display_name().to_string();
        let is_drawer = player.is_drawing();

        let verdict = if is_drawer {
            GuessVerdict::Incorrect
        } else {
            GuessEvaluator::check_guess(&mut room, handle, text, Instant::now())
        };

        let mut outcome = Outcome::none();
        match verdict {
            GuessVerdict::Correct { awarded, score } => {
                let line = ChatEntry::system(format!("{name} guessed the word!"));
                room.push_chat(line.clone());
                outcome.push(Dispatch::room(
                    code,
                    GameEvent::CorrectGuess {
                        name,
                        awarded,
                        score,
                    },
                ));
                outcome.push(Dispatch::room(code, GameEvent::Chat { entry: line }));
            }
            GuessVerdict::Incorrect => {
                let line = ChatEntry::player(name, text);
                room.push_chat(line.clone());
                outcome.push(Dispatch::room(code, GameEvent::Chat { entry: line }));
            }
        }

        if room.state().is_round_active() && GuessEvaluator::everyone_guessed(&room) {
            finish_round(&mut room, &mut outcome);
        }
        outcome
    }

    /// Relays a stroke from the drawer to everyone else.
    pub async fn submit_drawing(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
        payload: StrokePayload,
    ) -> Outcome {
        self.relay_from_drawer(code, handle, GameEvent::Stroke { payload })
            .await
    }

    /// Relays a canvas clear from the drawer to everyone else.
    pub async fn clear_canvas(&self, code: &RoomCode, handle: ConnectionHandle) -> Outcome {
        self.relay_from_drawer(code, handle, GameEvent::CanvasCleared)
            .await
    }

    async fn relay_from_drawer(
        &self,
        code: &RoomCode,
        handle: ConnectionHandle,
        event: GameEvent,
    ) -> Outcome {
        let Ok((_, room)) = self.lock_open(code).await else {
            return Outcome::none();
        };
        match room.authorize_drawer(handle) {
            Ok(_) => Outcome {
                dispatches: vec![Dispatch::room_except(code, handle, event)],
                transition: None,
            },
            Err(e) => {
                tracing::debug!(room = %code, error = %e, "drawer-only action dropped");
                Outcome::none()
            }
        }
    }

    // =====================================================================
    // Helpers
    // =====================================================================

    /// Looks up `code` and locks it. A room that was closed while we
    /// waited for the lock counts as not found.
    async fn lock_open(&self, code: &RoomCode) -> Result<(SharedRoom, RoomGuard), RoomError> {
        let shared = self
            .registry
            .get_room(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let guard = Arc::clone(&shared).lock_owned().await;
        if guard.is_closed() {
            return Err(RoomError::NotFound(code.clone()));
        }
        Ok((shared, guard))
    }
}

/// Trims and length-checks a display name.
pub fn validate_name(name: &str) -> Result<&str, Rejection> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Rejection::EmptyName);
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(Rejection::NameTooLong {
            max: MAX_NAME_CHARS,
        });
    }
    Ok(name)
}

/// Starts a round on an already locked room.
fn begin_round(room: &mut Room) -> Result<Outcome, SessionError> {
    if room.len() < room.min_players() {
        return Err(Rejection::NotEnoughPlayers {
            needed: room.min_players(),
            present: room.len(),
        }
        .into());
    }

    let mut outcome = Outcome::none();
    outcome.extend(TurnController::start_round(
        room,
        &mut rand::rng(),
        Instant::now(),
    ));

    if let Some(drawer) = room.drawer() {
        let line = ChatEntry::system(format!(
            "Round {}: {} is drawing",
            room.round_number(),
            drawer.display_name()
        ));
        room.push_chat(line.clone());
        outcome.push(Dispatch::room(room.code(), GameEvent::Chat { entry: line }));
    }

    outcome.transition = Some(Transition::RoundStarted {
        code: room.code().clone(),
        round: room.round_number(),
        duration: room.round_duration(),
    });
    Ok(outcome)
}

/// Ends the round on an already locked room, if one is running.
fn finish_round(room: &mut Room, outcome: &mut Outcome) {
    let dispatches = TurnController::end_round(room);
    if dispatches.is_empty() {
        return;
    }
    outcome.extend(dispatches);
    outcome.transition = Some(Transition::RoundEnded {
        code: room.code().clone(),
        round: room.round_number(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_trims() {
        assert_eq!(validate_name("  Alice ").unwrap(), "Alice");
    }

    #[test]
    fn test_validate_name_rejects_blank() {
        assert_eq!(validate_name("   "), Err(Rejection::EmptyName));
    }

    #[test]
    fn test_validate_name_rejects_long() {
        let long = "x".repeat(MAX_NAME_CHARS + 1);
        assert_eq!(
            validate_name(&long),
            Err(Rejection::NameTooLong {
                max: MAX_NAME_CHARS
            })
        );
        assert!(validate_name(&"x".repeat(MAX_NAME_CHARS)).is_ok());
    }
}
