//! The player entity.

use sketchwire_protocol::{ConnectionHandle, PlayerView};

/// One participant of a room.
///
/// Identity across reconnects is the display name (compared
/// case-insensitively); the connection handle is whatever live socket the
/// player currently uses and is overwritten on reconnect.
///
/// Fields are crate-private so only the room's own state transitions can
/// touch the score and round flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub(crate) connection_handle: ConnectionHandle,
    pub(crate) display_name: String,
    pub(crate) score: u32,
    pub(crate) is_drawing: bool,
    pub(crate) has_guessed_correctly: bool,
}

impl Player {
    pub(crate) fn new(connection_handle: ConnectionHandle, display_name: String) -> Self {
        Self {
            connection_handle,
            display_name,
            score: 0,
            is_drawing: false,
            has_guessed_correctly: false,
        }
    }

    pub fn connection_handle(&self) -> ConnectionHandle {
        self.connection_handle
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    pub fn has_guessed_correctly(&self) -> bool {
        self.has_guessed_correctly
    }

    /// Returns `true` if `name` refers to this player (case-insensitive).
    pub fn answers_to(&self, name: &str) -> bool {
        self.display_name.to_lowercase() == name.to_lowercase()
    }

    /// Adds points. Scores only ever grow within a game.
    pub(crate) fn award(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub(crate) fn view(&self, is_host: bool) -> PlayerView {
        PlayerView {
            name: self.display_name.clone(),
            score: self.score,
            is_drawing: self.is_drawing,
            has_guessed: self.has_guessed_correctly,
            is_host,
        }
    }
}
