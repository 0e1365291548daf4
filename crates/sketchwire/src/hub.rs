//! Fan-out of game events to connections.
//!
//! The session layer addresses events to a room, a room minus one
//! connection, or a single connection. The hub resolves those addresses
//! against its own membership table and pushes each event onto the
//! target connection's outbound channel. A per-connection writer task
//! drains the channel, so delivery never waits on a slow socket.

use std::collections::HashSet;

use dashmap::DashMap;
use sketchwire_protocol::{ConnectionHandle, Dispatch, GameEvent, Recipient, RoomCode};
use tokio::sync::mpsc;

/// Outbound half of a connection's event queue.
pub type Outbox = mpsc::UnboundedSender<GameEvent>;

/// Connection registry and room membership for delivery.
#[derive(Default)]
pub struct Hub {
    peers: DashMap<ConnectionHandle, Outbox>,
    groups: DashMap<RoomCode, HashSet<ConnectionHandle>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection and returns the receiving end of its queue.
    pub fn register(&self, handle: ConnectionHandle) -> mpsc::UnboundedReceiver<GameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.peers.insert(handle, tx);
        rx
    }

    /// Drops the connection's queue. Its writer finishes once the queue
    /// drains.
    pub fn unregister(&self, handle: ConnectionHandle) {
        self.peers.remove(&handle);
    }

    /// Adds `handle` to the delivery group of `code`.
    pub fn enter(&self, code: &RoomCode, handle: ConnectionHandle) {
        self.groups.entry(code.clone()).or_default().insert(handle);
    }

    /// Removes `handle` from the delivery group of `code`.
    pub fn exit(&self, code: &RoomCode, handle: ConnectionHandle) {
        self.groups.remove_if_mut(code, |_, members| {
            members.remove(&handle);
            members.is_empty()
        });
    }

    /// Forgets the delivery group of a room that no longer exists.
    pub fn close_room(&self, code: &RoomCode) {
        self.groups.remove(code);
    }

    /// Connections currently grouped under `code`.
    pub fn members(&self, code: &RoomCode) -> Vec<ConnectionHandle> {
        self.groups
            .get(code)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.peers.len()
    }

    /// Queues one event for one connection. Returns `false` if the
    /// connection is gone.
    pub fn send_to(&self, handle: ConnectionHandle, event: GameEvent) -> bool {
        match self.peers.get(&handle) {
            Some(outbox) => outbox.send(event).is_ok(),
            None => false,
        }
    }

    /// Delivers dispatches in order.
    pub fn deliver(&self, dispatches: Vec<Dispatch>) {
        for Dispatch { recipient, event } in dispatches {
            match recipient {
                Recipient::Connection(handle) => {
                    if !self.send_to(handle, event) {
                        tracing::trace!(conn = %handle, "dropped event for closed connection");
                    }
                }
                Recipient::Room(code) => self.broadcast(&code, None, &event),
                Recipient::RoomExcept(code, except) => {
                    self.broadcast(&code, Some(except), &event)
                }
            }
        }
    }

    fn broadcast(&self, code: &RoomCode, except: Option<ConnectionHandle>, event: &GameEvent) {
        for handle in self.members(code) {
            if Some(handle) != except {
                self.send_to(handle, event.clone());
            }
        }
    }
}
