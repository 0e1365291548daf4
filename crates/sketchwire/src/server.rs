//! `SketchwireServer` builder and server loop.
//!
//! This is the entry point for running a Sketchwire game server. It ties
//! together all the layers: transport → protocol → session → room, plus
//! the round clock that ends and advances rounds on time.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sketchwire_clock::{Alarm, AlarmHandler, AlarmKind, RoundClock};
use sketchwire_protocol::JsonCodec;
use sketchwire_room::{RoomConfig, RoomRegistry};
use sketchwire_session::{Outcome, SessionCoordinator, Transition};
use sketchwire_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::hub::Hub;
use crate::{ServerConfig, SketchwireError};

/// Shared server state passed to each connection handler task.
///
/// Owns the clock, which points back here weakly; see
/// [`AlarmHandler`] for the alarm side.
pub(crate) struct ServerState {
    pub(crate) coordinator: SessionCoordinator,
    pub(crate) hub: Hub,
    pub(crate) clock: RoundClock<ServerState>,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

impl ServerState {
    fn new(config: ServerConfig) -> Arc<Self> {
        let registry = Arc::new(RoomRegistry::new(config.room.clone()));
        Arc::new_cyclic(|weak| Self {
            coordinator: SessionCoordinator::new(registry),
            hub: Hub::new(),
            clock: RoundClock::new(weak.clone()),
            codec: JsonCodec,
            config,
        })
    }

    /// Delivers an outcome's events and moves the room's alarm along with
    /// its lifecycle.
    pub(crate) fn apply(&self, outcome: Outcome) {
        self.hub.deliver(outcome.dispatches);

        let Some(transition) = outcome.transition else {
            return;
        };
        match transition {
            Transition::RoundStarted {
                code,
                round,
                duration,
            } => {
                self.clock.arm(Alarm::round_expired(code, round), duration);
            }
            Transition::RoundEnded { code, round } => match self.config.intermission {
                Some(pause) => {
                    self.clock.arm(Alarm::next_round(code, round), pause);
                }
                None => {
                    self.clock.disarm_through(&code, round);
                }
            },
            Transition::RoomClosed { code } => {
                self.clock.disarm(&code);
                self.hub.close_room(&code);
            }
        }
    }
}

impl AlarmHandler for ServerState {
    async fn on_alarm(&self, alarm: Alarm) {
        let outcome = match alarm.kind {
            AlarmKind::RoundExpired => {
                self.coordinator
                    .expire_round(&alarm.code, alarm.round)
                    .await
            }
            AlarmKind::NextRound => {
                self.coordinator
                    .advance_round(&alarm.code, alarm.round)
                    .await
            }
        };
        self.apply(outcome);
    }
}

/// Builder for configuring and starting a Sketchwire server.
///
/// # Example
///
/// ```rust,ignore
/// use sketchwire::prelude::*;
///
/// let server = SketchwireServer::builder()
///     .bind("0.0.0.0:8080")
///     .round_duration(Duration::from_secs(60))
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SketchwireServerBuilder {
    config: ServerConfig,
}

impl SketchwireServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules applied to every room.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    pub fn round_duration(mut self, duration: Duration) -> Self {
        self.config.room.round_duration = duration;
        self
    }

    pub fn word_pool(mut self, words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.room.word_pool = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Pause before the next round starts by itself; `None` disables
    /// automatic advancing.
    pub fn intermission(mut self, pause: Option<Duration>) -> Self {
        self.config.intermission = pause;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SketchwireServer, SketchwireError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let state = ServerState::new(self.config);
        Ok(SketchwireServer { transport, state })
    }
}

impl Default for SketchwireServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Sketchwire game server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SketchwireServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl SketchwireServer {
    /// Creates a new builder.
    pub fn builder() -> SketchwireServerBuilder {
        SketchwireServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// The coordinator behind this server, for embedding and inspection.
    pub fn coordinator(&self) -> &SessionCoordinator {
        &self.state.coordinator
    }

    /// Runs the accept loop.
    ///
    /// Spawns a handler task for each connected client. Runs until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), SketchwireError> {
        tracing::info!("Sketchwire server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) if e.is_per_connection() => {
                    tracing::debug!(error = %e, "rejected connection");
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
