//! Core protocol types.
//!
//! Everything here is plain data: serializable, cloneable, and free of
//! game rules. The session layer builds these values; the edge routes and
//! encodes them.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identity of one live client connection.
///
/// A player keeps their display name across page refreshes, but every
/// refresh produces a new connection and therefore a new handle. Drawing
/// and clearing are authorized by handle, never by name.
///
/// `#[serde(transparent)]` makes `ConnectionHandle(7)` serialize as `7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionHandle(pub u64);

impl fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A room's short join code.
///
/// Codes are case-insensitive for humans, so the constructor uppercases
/// (and trims) whatever it is given. Two codes that differ only in case
/// are the same `RoomCode`, whether they came from the generator, a
/// registry lookup, or a decoded client command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Length of generated codes.
    pub const LEN: usize = 6;

    /// Creates a normalized room code.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_uppercase())
    }

    /// Returns the normalized code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<&str> for RoomCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient / Dispatch
// ---------------------------------------------------------------------------

/// Who should receive an event.
///
/// The core never sends anything itself. It returns `(Recipient, event)`
/// pairs and the edge resolves the recipient against its own grouping of
/// connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connection grouped under the room.
    Room(RoomCode),

    /// Every connection in the room except one (usually the sender).
    RoomExcept(RoomCode, ConnectionHandle),

    /// A single connection.
    Connection(ConnectionHandle),
}

/// One addressed event, ready for fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispatch {
    pub recipient: Recipient,
    pub event: GameEvent,
}

impl Dispatch {
    /// Addresses `event` to the whole room.
    pub fn room(code: &RoomCode, event: GameEvent) -> Self {
        Self {
            recipient: Recipient::Room(code.clone()),
            event,
        }
    }

    /// Addresses `event` to the room minus `except`.
    pub fn room_except(
        code: &RoomCode,
        except: ConnectionHandle,
        event: GameEvent,
    ) -> Self {
        Self {
            recipient: Recipient::RoomExcept(code.clone(), except),
            event,
        }
    }

    /// Addresses `event` to a single connection.
    pub fn to(handle: ConnectionHandle, event: GameEvent) -> Self {
        Self {
            recipient: Recipient::Connection(handle),
            event,
        }
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// What every client is allowed to know about a player.
///
/// Note the absence of the connection handle: handles are authorization
/// material and never leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub score: u32,
    pub is_drawing: bool,
    pub has_guessed: bool,
    pub is_host: bool,
}

/// Who wrote a chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatKind {
    /// Typed by a player (a guess that did not match, or drawer chatter).
    Player,
    /// Generated by the server ("Bob joined", "Alice guessed the word!").
    System,
}

/// One line of a room's chat history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub kind: ChatKind,
    /// Display name of the author; `None` for system lines.
    pub author: Option<String>,
    pub text: String,
}

impl ChatEntry {
    /// A line typed by `author`.
    pub fn player(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: ChatKind::Player,
            author: Some(author.into()),
            text: text.into(),
        }
    }

    /// A server-generated line.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            kind: ChatKind::System,
            author: None,
            text: text.into(),
        }
    }
}

/// The part of an active round a (re)joining client needs to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundView {
    pub round_number: u32,
    pub drawer: String,
    pub masked_word: String,
    pub word_length: usize,
    pub duration_secs: u64,
    pub remaining_secs: u64,
    /// Plaintext word; only present when the recipient is the drawer.
    pub word: Option<String>,
}

/// One row of a room listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub code: RoomCode,
    pub player_count: usize,
    pub round_number: u32,
    pub round_active: bool,
}

/// The lifecycle phase of a room, as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Waiting,
    Drawing,
    RoundEnd,
}

/// Drawing-stroke payload.
///
/// The server relays strokes without looking inside them, so this is an
/// arbitrary JSON value the client defines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrokePayload(pub serde_json::Value);

// ---------------------------------------------------------------------------
// GameEvent: server → client
// ---------------------------------------------------------------------------

/// Every event the server can send.
///
/// Each variant has a fixed field set, so a client can switch on `type`
/// and a test can match on the variant without parsing free-form maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    /// Caller only: a room was created for you.
    RoomCreated { code: RoomCode },

    /// Caller only: full state after join or reconnect.
    Welcome {
        code: RoomCode,
        you: PlayerView,
        players: Vec<PlayerView>,
        chat: Vec<ChatEntry>,
        phase: RoomPhase,
        round: Option<RoundView>,
        reconnected: bool,
    },

    /// Everyone else: someone joined (or came back).
    PlayerJoined {
        name: String,
        players: Vec<PlayerView>,
    },

    /// Everyone remaining: someone left.
    PlayerLeft {
        name: String,
        players: Vec<PlayerView>,
    },

    /// A chat line appended to the room's history.
    Chat { entry: ChatEntry },

    /// Drawer only: the plaintext word for the new round.
    YourTurn {
        word: String,
        round_number: u32,
        duration_secs: u64,
    },

    /// Everyone but the drawer: a round started. Never carries the word.
    RoundStarted {
        drawer: String,
        masked_word: String,
        word_length: usize,
        round_number: u32,
        duration_secs: u64,
    },

    /// Everyone: a player guessed the word.
    CorrectGuess {
        name: String,
        awarded: u32,
        score: u32,
    },

    /// Everyone: the round is over.
    RoundEnded {
        word: String,
        round_number: u32,
        standings: Vec<PlayerView>,
    },

    /// Everyone but the drawer: a stroke to render.
    Stroke { payload: StrokePayload },

    /// Everyone but the drawer: wipe the canvas.
    CanvasCleared,

    /// Caller only: a room listing.
    RoomList { rooms: Vec<RoomSummary> },

    /// Caller only: a human-readable refusal ("room not found", ...).
    Notice { message: String },

    /// Caller only: answer to a `Heartbeat`, echoing the client's clock.
    HeartbeatAck { client_time: u64 },
}

// ---------------------------------------------------------------------------
// ClientCommand: client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask for.
///
/// The room code is implied by the connection for every command except
/// `CreateRoom`, `JoinRoom`, `ListRooms` and `Heartbeat`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientCommand {
    CreateRoom { name: String },
    JoinRoom { code: RoomCode, name: String },
    StartRound,
    /// Chat line or guess; the server decides which.
    Say { text: String },
    Draw { payload: StrokePayload },
    ClearCanvas,
    EndRound,
    LeaveRoom,
    ListRooms,
    /// Keeps a quiet connection from being dropped as idle.
    Heartbeat {
        #[serde(default)]
        client_time: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_normalizes_case_and_whitespace() {
        assert_eq!(RoomCode::new(" ab12cd ").as_str(), "AB12CD");
        assert_eq!(RoomCode::new("ab12cd"), RoomCode::new("AB12CD"));
    }

    #[test]
    fn test_room_code_deserialize_normalizes() {
        let code: RoomCode = serde_json::from_str(r#""xyz789""#).unwrap();
        assert_eq!(code.as_str(), "XYZ789");
        assert_eq!(serde_json::to_string(&code).unwrap(), r#""XYZ789""#);
    }

    #[test]
    fn test_connection_handle_display_and_json() {
        let handle = ConnectionHandle(7);
        assert_eq!(handle.to_string(), "conn-7");
        assert_eq!(serde_json::to_string(&handle).unwrap(), "7");
    }

    #[test]
    fn test_dispatch_constructors_address_correctly() {
        let code = RoomCode::new("abcdef");
        let d = Dispatch::room_except(&code, ConnectionHandle(3), GameEvent::CanvasCleared);
        assert_eq!(
            d.recipient,
            Recipient::RoomExcept(RoomCode::new("ABCDEF"), ConnectionHandle(3))
        );
        let d = Dispatch::to(ConnectionHandle(9), GameEvent::CanvasCleared);
        assert_eq!(d.recipient, Recipient::Connection(ConnectionHandle(9)));
    }

    #[test]
    fn test_stroke_payload_is_opaque_json() {
        let json = r##"{"type":"Draw","payload":{"x":[1,2,3],"color":"#f00"}}"##;
        let cmd: ClientCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ClientCommand::Draw { payload } => {
                assert_eq!(payload.0["color"], "#f00");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_heartbeat_time_is_optional() {
        let bare: ClientCommand = serde_json::from_str(r#"{"type":"Heartbeat"}"#).unwrap();
        assert_eq!(bare, ClientCommand::Heartbeat { client_time: 0 });

        let timed: ClientCommand =
            serde_json::from_str(r#"{"type":"Heartbeat","client_time":42}"#).unwrap();
        assert_eq!(timed, ClientCommand::Heartbeat { client_time: 42 });
    }

    #[test]
    fn test_round_started_has_no_word_field() {
        let event = GameEvent::RoundStarted {
            drawer: "Alice".into(),
            masked_word: "_____".into(),
            word_length: 5,
            round_number: 1,
            duration_secs: 80,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("word").is_none());
        assert_eq!(json["masked_word"], "_____");
    }

    #[test]
    fn test_chat_entry_constructors() {
        let line = ChatEntry::player("Bob", "is it a cat?");
        assert_eq!(line.kind, ChatKind::Player);
        assert_eq!(line.author.as_deref(), Some("Bob"));

        let sys = ChatEntry::system("Bob joined");
        assert_eq!(sys.kind, ChatKind::System);
        assert!(sys.author.is_none());
    }
}
