//! The room entity: one game session, its players, chat and round state.
//!
//! A `Room` is plain data behind a `tokio::sync::Mutex` (see
//! [`SharedRoom`]). Every method here assumes the caller holds that lock
//! for the whole logical operation, so multi-field updates (player list +
//! chat line, drawer + word + round counter) are observed atomically.

use std::sync::Arc;
use std::time::Duration;

use sketchwire_protocol::{
    ChatEntry, ConnectionHandle, PlayerView, RoomCode, RoomSummary, RoundView,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{Player, RoomConfig, RoomError, RoomState};

/// A room as stored in the registry: shared, individually locked.
pub type SharedRoom = Arc<Mutex<Room>>;

/// What happened when a name was admitted to a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A new player was appended at `index`.
    Joined { index: usize },
    /// The name already existed; its handle was replaced.
    Reconnected {
        index: usize,
        replaced: ConnectionHandle,
    },
}

impl Admission {
    pub fn index(&self) -> usize {
        match self {
            Self::Joined { index } | Self::Reconnected { index, .. } => *index,
        }
    }
}

/// One game session.
#[derive(Debug)]
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) players: Vec<Player>,
    pub(crate) current_drawer: Option<ConnectionHandle>,
    pub(crate) secret_word: String,
    pub(crate) round_number: u32,
    pub(crate) round_duration: Duration,
    pub(crate) round_started_at: Option<Instant>,
    pub(crate) state: RoomState,
    pub(crate) min_players: usize,
    pub(crate) word_pool: Vec<String>,
    pub(crate) chat_history: Vec<ChatEntry>,
    /// Set when the last player leaves. A task that fetched the room just
    /// before it was removed from the registry must treat it as gone.
    closed: bool,
}

impl Room {
    /// Creates an empty room in the `Waiting` state.
    pub fn new(code: RoomCode, config: &RoomConfig) -> Self {
        Self {
            code,
            players: Vec::new(),
            current_drawer: None,
            secret_word: String::new(),
            round_number: 0,
            round_duration: config.round_duration,
            round_started_at: None,
            state: RoomState::Waiting,
            min_players: config.min_players,
            word_pool: config.word_pool.clone(),
            chat_history: Vec::new(),
            closed: false,
        }
    }

    // -- Accessors --------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Players in join order. Order defines drawer rotation.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn round_duration(&self) -> Duration {
        self.round_duration
    }

    pub fn round_started_at(&self) -> Option<Instant> {
        self.round_started_at
    }

    pub fn min_players(&self) -> usize {
        self.min_players
    }

    pub fn secret_word(&self) -> &str {
        &self.secret_word
    }

    pub fn current_drawer(&self) -> Option<ConnectionHandle> {
        self.current_drawer
    }

    pub fn chat_history(&self) -> &[ChatEntry] {
        &self.chat_history
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    // -- Lookups ----------------------------------------------------------

    pub fn position_of(&self, handle: ConnectionHandle) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.connection_handle == handle)
    }

    pub fn position_by_name(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| p.answers_to(name))
    }

    pub fn player(&self, handle: ConnectionHandle) -> Option<&Player> {
        self.players.iter().find(|p| p.connection_handle == handle)
    }

    /// The host is whoever has been in the room longest.
    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn is_host(&self, handle: ConnectionHandle) -> bool {
        self.host()
            .is_some_and(|p| p.connection_handle == handle)
    }

    pub fn drawer(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_drawing)
    }

    pub fn drawer_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_drawing).count()
    }

    /// The gate for strokes and canvas clears.
    ///
    /// # Errors
    /// - [`RoomError::PlayerNotFound`] if no player holds `handle`
    /// - [`RoomError::Unauthorized`] if that player is not drawing
    pub fn authorize_drawer(
        &self,
        handle: ConnectionHandle,
    ) -> Result<&Player, RoomError> {
        let player = self
            .player(handle)
            .ok_or(RoomError::PlayerNotFound(handle))?;
        if !player.is_drawing {
            return Err(RoomError::Unauthorized(handle));
        }
        Ok(player)
    }

    // -- Mutations --------------------------------------------------------

    /// Adds `name` to the room, or rebinds the existing player with that
    /// name to `handle`.
    ///
    /// A reconnecting drawer also moves `current_drawer` to the new
    /// handle; otherwise the real drawer would fail the stroke gate.
    pub fn admit(&mut self, handle: ConnectionHandle, name: &str) -> Admission {
        if let Some(index) = self.position_by_name(name) {
            let player = &mut self.players[index];
            let replaced = player.connection_handle;
            player.connection_handle = handle;
            if player.is_drawing {
                self.current_drawer = Some(handle);
            }
            tracing::info!(
                room = %self.code,
                name,
                old = %replaced,
                new = %handle,
                "player reconnected"
            );
            return Admission::Reconnected { index, replaced };
        }

        self.players.push(Player::new(handle, name.to_string()));
        tracing::info!(
            room = %self.code,
            name,
            conn = %handle,
            players = self.players.len(),
            "player joined"
        );
        Admission::Joined {
            index: self.players.len() - 1,
        }
    }

    /// Removes the player holding `handle`, returning them.
    ///
    /// If they were the drawer, `current_drawer` is cleared so the next
    /// rotation starts from the head of the list.
    pub fn remove_player(&mut self, handle: ConnectionHandle) -> Option<Player> {
        let index = self.position_of(handle)?;
        let player = self.players.remove(index);
        if self.current_drawer == Some(handle) {
            self.current_drawer = None;
        }
        tracing::info!(
            room = %self.code,
            name = %player.display_name,
            conn = %handle,
            players = self.players.len(),
            "player left"
        );
        Some(player)
    }

    /// Appends a line to the chat history.
    pub fn push_chat(&mut self, entry: ChatEntry) {
        self.chat_history.push(entry);
    }

    /// Marks the room as gone. Called with the lock held, right before the
    /// registry entry is removed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    // -- Views ------------------------------------------------------------

    /// All players in join order.
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .enumerate()
            .map(|(i, p)| p.view(i == 0))
            .collect()
    }

    /// All players by descending score. Ties keep join order.
    pub fn standings(&self) -> Vec<PlayerView> {
        let mut views = self.player_views();
        // `sort_by` is stable, which is exactly the tie-break we want.
        views.sort_by(|a, b| b.score.cmp(&a.score));
        views
    }

    /// The active round as seen by `viewer`, or `None` between rounds.
    pub fn round_view(&self, viewer: ConnectionHandle, now: Instant) -> Option<RoundView> {
        if !self.state.is_round_active() {
            return None;
        }
        let drawer = self.drawer()?;
        let elapsed = self
            .round_started_at
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        let is_drawer = drawer.connection_handle == viewer;
        Some(RoundView {
            round_number: self.round_number,
            drawer: drawer.display_name.clone(),
            masked_word: crate::TurnController::masked_word(self),
            word_length: self.secret_word.chars().count(),
            duration_secs: self.round_duration.as_secs(),
            remaining_secs: self.round_duration.saturating_sub(elapsed).as_secs(),
            word: is_drawer.then(|| self.secret_word.clone()),
        })
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            code: self.code.clone(),
            player_count: self.players.len(),
            round_number: self.round_number,
            round_active: self.state.is_round_active(),
        }
    }
}
