//! Error types for the room layer.

use sketchwire_protocol::{ConnectionHandle, RoomCode};

/// Errors that can occur during room operations.
///
/// None of these are fatal. `NotFound` and `PlayerNotFound` are reported
/// back to the caller; `Unauthorized` is swallowed by the session layer
/// because it is almost always a stale client after a turn change.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (or was just closed).
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// No player in the room holds this connection handle.
    #[error("no player for {0} in this room")]
    PlayerNotFound(ConnectionHandle),

    /// The connection is not allowed to perform a drawer-only action.
    #[error("{0} is not the drawer")]
    Unauthorized(ConnectionHandle),
}
