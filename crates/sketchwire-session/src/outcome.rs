//! What a coordinator operation hands back to the edge.

use std::time::Duration;

use sketchwire_protocol::{ConnectionHandle, Dispatch, GameEvent, Recipient, RoomCode};
use sketchwire_room::Player;

/// A lifecycle change the edge may want to react to (timers, grouping).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    RoundStarted {
        code: RoomCode,
        round: u32,
        duration: Duration,
    },
    RoundEnded {
        code: RoomCode,
        round: u32,
    },
    /// The last player left; the room is gone from the registry.
    RoomClosed { code: RoomCode },
}

/// Events to deliver, plus the lifecycle change (if any) that produced
/// them. Dispatch order is delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub dispatches: Vec<Dispatch>,
    pub transition: Option<Transition>,
}

impl Outcome {
    /// An outcome with nothing to deliver.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty() && self.transition.is_none()
    }

    pub(crate) fn push(&mut self, dispatch: Dispatch) {
        self.dispatches.push(dispatch);
    }

    pub(crate) fn extend(&mut self, dispatches: impl IntoIterator<Item = Dispatch>) {
        self.dispatches.extend(dispatches);
    }

    /// Events addressed exactly to `recipient`, in order.
    pub fn events_for(&self, recipient: &Recipient) -> Vec<&GameEvent> {
        self.dispatches
            .iter()
            .filter(|d| &d.recipient == recipient)
            .map(|d| &d.event)
            .collect()
    }

    /// `true` if any dispatch carries an event matching `pred`.
    pub fn any_event(&self, pred: impl Fn(&GameEvent) -> bool) -> bool {
        self.dispatches.iter().any(|d| pred(&d.event))
    }
}

/// Result of a successful join.
#[derive(Debug, Clone)]
pub struct Joined {
    /// The player as stored after the join.
    pub player: Player,
    /// `true` if an existing player with this name was taken over.
    pub reconnected: bool,
    /// The handle that used to own this player, when it differs from the
    /// new one. The edge should drop it from the room's fan-out group.
    pub replaced: Option<ConnectionHandle>,
    pub outcome: Outcome,
}
