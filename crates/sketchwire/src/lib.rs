//! # Sketchwire
//!
//! Real-time draw-and-guess game server.
//!
//! One player per round draws a secret word while everyone else in the
//! room guesses in a shared chat. Correct guesses score more the sooner
//! they land, and the pen rotates through the room round after round.
//!
//! This crate is the WebSocket edge: it accepts connections, decodes
//! [`ClientCommand`](sketchwire_protocol::ClientCommand)s, calls the
//! [`SessionCoordinator`](sketchwire_session::SessionCoordinator), fans
//! the resulting events out to the right connections, and keeps each
//! room's round timer in step. It holds no game rules of its own.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sketchwire::prelude::*;
//!
//! # async fn start() -> Result<(), SketchwireError> {
//! let server = SketchwireServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod hub;
mod server;

pub use config::{ENV_ADDR, ENV_INTERMISSION_SECS, ENV_ROUND_SECS, ServerConfig};
pub use error::SketchwireError;
pub use hub::{Hub, Outbox};
pub use server::{SketchwireServer, SketchwireServerBuilder};

/// Everything needed to configure, run and talk to a server.
pub mod prelude {
    pub use crate::{ServerConfig, SketchwireError, SketchwireServer, SketchwireServerBuilder};
    pub use sketchwire_protocol::{
        ChatEntry, ChatKind, ClientCommand, ConnectionHandle, GameEvent, PlayerView, RoomCode,
        RoomPhase, RoomSummary, RoundView, StrokePayload,
    };
    pub use sketchwire_room::RoomConfig;
    pub use sketchwire_session::SessionCoordinator;
}
