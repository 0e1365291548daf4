//! Session coordination for Sketchwire.
//!
//! This crate is the only thing the transport edge talks to. It composes
//! the room registry, turn controller and guess evaluator into whole
//! operations (join, guess, leave, ...) and returns what must be
//! broadcast, without broadcasting anything itself.
//!
//! # How it fits in the stack
//!
//! ```text
//! Edge (sketchwire)        ← delivers Outcomes, arms round timers
//!     ↕
//! Session (this crate)     ← one room lock per operation
//!     ↕
//! Room (sketchwire-room)   ← pure rules on a locked Room
//! ```

mod coordinator;
mod error;
mod outcome;

pub use coordinator::{MAX_NAME_CHARS, SessionCoordinator, validate_name};
pub use error::{Rejection, SessionError};
pub use outcome::{Joined, Outcome, Transition};
