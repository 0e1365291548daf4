//! Room configuration and state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sketchwire_protocol::RoomPhase;

use crate::words::default_word_pool;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Length of a round. Also the ceiling of the time bonus.
    pub round_duration: Duration,

    /// Minimum players required to start a round.
    pub min_players: usize,

    /// Candidate secret words, sampled with replacement.
    pub word_pool: Vec<String>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(80),
            min_players: 2,
            word_pool: default_word_pool(),
        }
    }
}

impl RoomConfig {
    /// Round duration in whole seconds, as used by scoring and clients.
    pub fn round_duration_secs(&self) -> u64 {
        self.round_duration.as_secs()
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Waiting ──start──→ Drawing ──end──→ RoundEnd ──start──→ Drawing ...
/// ```
///
/// - **Waiting**: Room just created, no round has been played.
/// - **Drawing**: A drawer holds the secret word; guesses are scored.
/// - **RoundEnd**: Word revealed, scores shown. Waits for the next start.
///
/// There is no terminal state. A room ends by losing its last player, at
/// which point it is removed from the registry outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    Waiting,
    Drawing,
    RoundEnd,
}

impl RoomState {
    /// Returns `true` while guesses are being scored.
    pub fn is_round_active(&self) -> bool {
        matches!(self, Self::Drawing)
    }

    /// Returns `true` if moving to `target` is a legal transition.
    ///
    /// Starting a round is allowed from any state (a host may skip a
    /// round in progress), but only a running round can end.
    pub fn can_transition_to(self, target: Self) -> bool {
        match target {
            Self::Drawing => true,
            Self::RoundEnd => self == Self::Drawing,
            Self::Waiting => false,
        }
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Drawing => write!(f, "Drawing"),
            Self::RoundEnd => write!(f, "RoundEnd"),
        }
    }
}

impl From<RoomState> for RoomPhase {
    fn from(state: RoomState) -> Self {
        match state {
            RoomState::Waiting => RoomPhase::Waiting,
            RoomState::Drawing => RoomPhase::Drawing,
            RoomState::RoundEnd => RoomPhase::RoundEnd,
        }
    }
}
