//! Wire-level vocabulary for Sketchwire.
//!
//! This crate defines everything that crosses the boundary between the
//! game core and the transport edge:
//!
//! - **Identity** ([`ConnectionHandle`], [`RoomCode`]): who is talking
//!   and which room they mean.
//! - **Events** ([`GameEvent`], [`Dispatch`], [`Recipient`]): the closed
//!   set of things the core asks the edge to deliver, and to whom.
//! - **Commands** ([`ClientCommand`]): what a client may ask for.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how the above become bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ClientCommand / GameEvent) → Session (rooms)
//! ```
//!
//! The protocol layer has no opinion about rooms or scores. It only fixes
//! the shape of the messages so the core and the edge can be tested
//! independently of each other.

mod codec;
mod error;
mod types;

pub use codec::Codec;
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChatEntry, ChatKind, ClientCommand, ConnectionHandle, Dispatch, GameEvent,
    PlayerView, Recipient, RoomCode, RoomPhase, RoomSummary, RoundView,
    StrokePayload,
};
