//! Rooms, players and round rules for Sketchwire.
//!
//! Everything in this crate is synchronous, in-memory logic. Locking
//! discipline lives one layer up in `sketchwire-session`; this crate only
//! provides the lockable unit ([`SharedRoom`]) and the directory of them
//! ([`RoomRegistry`]).
//!
//! # Key types
//!
//! - [`Room`] / [`Player`]: the entities and their invariants
//! - [`RoomState`]: `Waiting → Drawing ⇄ RoundEnd`
//! - [`RoomRegistry`]: concurrent code → room directory
//! - [`TurnController`]: drawer rotation, word selection, masking
//! - [`GuessEvaluator`]: guess matching and time-decayed scoring

mod code;
mod config;
mod error;
mod guess;
mod player;
mod registry;
mod room;
mod turn;
mod words;

pub use code::generate_room_code;
pub use config::{RoomConfig, RoomState};
pub use error::RoomError;
pub use guess::{BASE_POINTS, GuessEvaluator, GuessVerdict};
pub use player::Player;
pub use registry::RoomRegistry;
pub use room::{Admission, Room, SharedRoom};
pub use turn::{MASK_CHAR, TurnController};
pub use words::{FALLBACK_WORD, default_word_pool};
