//! The two closed message vocabularies and the frame that carries them.
//!
//! On the wire every message is one JSON object:
//!
//! ```text
//! { "type": "LOBBY_DATA", "payload": { "players": [...] }, "timestamp": 1700000000000 }
//! ```
//!
//! `type` picks the variant, `payload` is shaped by that variant, and the
//! optional `timestamp` is milliseconds since the UNIX epoch. Rust models
//! each vocabulary as an enum with one variant per `type`, so every
//! `match` over a message is checked for exhaustiveness by the compiler.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{CharacterPlacement, PlayerId, PlayerSnapshot, Stage};
use crate::ProtocolError;

// ---------------------------------------------------------------------------
// WireMessage
// ---------------------------------------------------------------------------

/// A closed vocabulary that can be split into, and rebuilt from, a
/// `type` tag and a JSON payload.
///
/// Both [`ClientMessage`] and [`ServerMessage`] implement it, so either
/// side of the conversation can be encoded or decoded by a
/// [`Codec`](crate::Codec).
pub trait WireMessage: Sized {
    /// The wire `type` tag of this message.
    fn kind(&self) -> &'static str;

    /// Serializes the payload object.
    fn to_payload(&self) -> Result<Value, serde_json::Error>;

    /// Rebuilds a message from its tag and payload.
    ///
    /// # Errors
    /// - [`ProtocolError::UnknownType`] if `kind` is not in the vocabulary.
    /// - [`ProtocolError::InvalidPayload`] if the payload has the wrong shape.
    fn from_parts(kind: &str, payload: Value) -> Result<Self, ProtocolError>;
}

/// Deserializes a payload, treating a missing/`null` payload as `{}`.
fn payload<T: DeserializeOwned>(
    kind: &str,
    payload: Value,
) -> Result<T, ProtocolError> {
    let payload = match payload {
        Value::Null => Value::Object(serde_json::Map::new()),
        other => other,
    };
    serde_json::from_value(payload).map_err(|source| {
        ProtocolError::InvalidPayload {
            kind: kind.to_string(),
            source,
        }
    })
}

/// The payload of `PING` and `PONG`: an empty object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// `JOIN`: the first message on every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub player_name: String,
}

/// `READY_STATUS`: toggles the sender's ready flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyStatusPayload {
    pub status: bool,
}

/// `ADD_CHARACTER`: asks the server to place a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCharacterPayload {
    pub character: CharacterPlacement,
}

/// `CHOOSE`: picks a side/option (e.g. `"heads"` or `"tails"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoosePayload {
    pub choice: String,
}

/// Commands the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    Join(JoinPayload),
    ReadyStatus(ReadyStatusPayload),
    AddCharacter(AddCharacterPayload),
    Choose(ChoosePayload),
    Ping(Empty),
}

impl ClientMessage {
    pub const JOIN: &'static str = "JOIN";
    pub const READY_STATUS: &'static str = "READY_STATUS";
    pub const ADD_CHARACTER: &'static str = "ADD_CHARACTER";
    pub const CHOOSE: &'static str = "CHOOSE";
    pub const PING: &'static str = "PING";

    pub fn join(player_name: impl Into<String>) -> Self {
        Self::Join(JoinPayload {
            player_name: player_name.into(),
        })
    }

    pub fn ready_status(status: bool) -> Self {
        Self::ReadyStatus(ReadyStatusPayload { status })
    }

    pub fn add_character(character: CharacterPlacement) -> Self {
        Self::AddCharacter(AddCharacterPayload { character })
    }

    pub fn choose(choice: impl Into<String>) -> Self {
        Self::Choose(ChoosePayload {
            choice: choice.into(),
        })
    }

    pub fn ping() -> Self {
        Self::Ping(Empty {})
    }
}

impl WireMessage for ClientMessage {
    fn kind(&self) -> &'static str {
        match self {
            Self::Join(_) => Self::JOIN,
            Self::ReadyStatus(_) => Self::READY_STATUS,
            Self::AddCharacter(_) => Self::ADD_CHARACTER,
            Self::Choose(_) => Self::CHOOSE,
            Self::Ping(_) => Self::PING,
        }
    }

    fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Join(p) => serde_json::to_value(p),
            Self::ReadyStatus(p) => serde_json::to_value(p),
            Self::AddCharacter(p) => serde_json::to_value(p),
            Self::Choose(p) => serde_json::to_value(p),
            Self::Ping(p) => serde_json::to_value(p),
        }
    }

    fn from_parts(kind: &str, body: Value) -> Result<Self, ProtocolError> {
        match kind {
            Self::JOIN => payload(kind, body).map(Self::Join),
            Self::READY_STATUS => payload(kind, body).map(Self::ReadyStatus),
            Self::ADD_CHARACTER => payload(kind, body).map(Self::AddCharacter),
            Self::CHOOSE => payload(kind, body).map(Self::Choose),
            Self::PING => payload(kind, body).map(Self::Ping),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// `JOINED`: the server accepted the join and assigned an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinedPayload {
    pub player_id: PlayerId,
}

/// `LOBBY_DATA`: a complete snapshot of everyone in the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyDataPayload {
    pub players: Vec<PlayerSnapshot>,
}

/// `GAME_STAGE`: the session moved to a new stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStagePayload {
    pub stage: Stage,
}

/// `ERROR`: the server rejected something the client did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Updates the server pushes to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Joined(JoinedPayload),
    LobbyData(LobbyDataPayload),
    GameStage(GameStagePayload),
    Error(ErrorPayload),
    Pong(Empty),
}

impl ServerMessage {
    pub const JOINED: &'static str = "JOINED";
    pub const LOBBY_DATA: &'static str = "LOBBY_DATA";
    pub const GAME_STAGE: &'static str = "GAME_STAGE";
    pub const ERROR: &'static str = "ERROR";
    pub const PONG: &'static str = "PONG";

    pub fn joined(player_id: impl Into<PlayerId>) -> Self {
        Self::Joined(JoinedPayload {
            player_id: player_id.into(),
        })
    }

    pub fn lobby_data(players: Vec<PlayerSnapshot>) -> Self {
        Self::LobbyData(LobbyDataPayload { players })
    }

    pub fn game_stage(stage: impl Into<Stage>) -> Self {
        Self::GameStage(GameStagePayload {
            stage: stage.into(),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            message: message.into(),
        })
    }

    pub fn pong() -> Self {
        Self::Pong(Empty {})
    }
}

impl WireMessage for ServerMessage {
    fn kind(&self) -> &'static str {
        match self {
            Self::Joined(_) => Self::JOINED,
            Self::LobbyData(_) => Self::LOBBY_DATA,
            Self::GameStage(_) => Self::GAME_STAGE,
            Self::Error(_) => Self::ERROR,
            Self::Pong(_) => Self::PONG,
        }
    }

    fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Joined(p) => serde_json::to_value(p),
            Self::LobbyData(p) => serde_json::to_value(p),
            Self::GameStage(p) => serde_json::to_value(p),
            Self::Error(p) => serde_json::to_value(p),
            Self::Pong(p) => serde_json::to_value(p),
        }
    }

    fn from_parts(kind: &str, body: Value) -> Result<Self, ProtocolError> {
        match kind {
            Self::JOINED => payload(kind, body).map(Self::Joined),
            Self::LOBBY_DATA => payload(kind, body).map(Self::LobbyData),
            Self::GAME_STAGE => payload(kind, body).map(Self::GameStage),
            Self::ERROR => payload(kind, body).map(Self::Error),
            Self::PONG => payload(kind, body).map(Self::Pong),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Frame
// ---------------------------------------------------------------------------

/// One unit on the wire: a message plus an optional timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<M> {
    pub message: M,

    /// Milliseconds since the UNIX epoch, set by the sender.
    pub timestamp: Option<u64>,
}

impl<M> Frame<M> {
    /// A frame without a timestamp.
    pub fn new(message: M) -> Self {
        Self {
            message,
            timestamp: None,
        }
    }

    /// A frame stamped with `timestamp` (ms since the UNIX epoch).
    pub fn stamped(message: M, timestamp: u64) -> Self {
        Self {
            message,
            timestamp: Some(timestamp),
        }
    }

    pub fn into_message(self) -> M {
        self.message
    }
}
