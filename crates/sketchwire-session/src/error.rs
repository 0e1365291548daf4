//! Error types for the session layer.

use sketchwire_room::RoomError;

/// Errors a coordinator operation can report to its caller.
///
/// Only `join` and `start_round` surface errors. Every other operation
/// degrades to an empty [`Outcome`](crate::Outcome) instead, because a bad
/// message from one client must never disturb a room shared by others.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Room or player lookup failed, or a drawer-only action was refused.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A business rule refused the request. Safe to show to the user.
    #[error("{0}")]
    Rejected(#[from] Rejection),
}

impl SessionError {
    /// `true` for errors the edge should drop without telling anyone.
    ///
    /// Unauthorized draw attempts come from stale clients after a turn
    /// change, not from anything the user can act on.
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Room(RoomError::Unauthorized(_)))
    }
}

/// Business-rule refusals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("need at least {needed} players to start a round (have {present})")]
    NotEnoughPlayers { needed: usize, present: usize },

    #[error("display name must not be empty")]
    EmptyName,

    #[error("display name must be at most {max} characters")]
    NameTooLong { max: usize },

    /// The connection already plays in this room under another name.
    #[error("already in this room as {0}")]
    AlreadyInRoom(String),
}
