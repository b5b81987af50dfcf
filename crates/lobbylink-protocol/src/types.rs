//! Data types shared by the lobby messages.
//!
//! Every type here travels "on the wire" inside a message payload. The
//! field names are fixed by the server's JSON contract, so most structs
//! carry `#[serde(rename_all = "camelCase")]` to map Rust's snake_case
//! fields onto keys like `isReady` and `playerName`.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A player identifier assigned by the server.
///
/// The server mints these (a UUID string in practice) and the client
/// treats them as opaque. Wrapping the `String` in a newtype keeps a
/// player id from being confused with a player *name*, which is also a
/// string.
///
/// `#[serde(transparent)]` serializes `PlayerId("p1")` as plain `"p1"`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ---------------------------------------------------------------------------
// Board types
// ---------------------------------------------------------------------------

/// A cell coordinate on the game grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A character placed on the grid, as reported by the server.
///
/// Clients only ever see characters inside a [`PlayerSnapshot`]; to ask
/// for a new one they send a [`CharacterPlacement`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Grid position. The wire key is `pos`.
    #[serde(rename = "pos")]
    pub position: Position,

    /// Rotation in whatever unit the game uses (degrees in practice).
    pub rotation: i32,

    /// The owning player. Older servers omit it, in which case the owner
    /// is the player whose snapshot contains the character.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<PlayerId>,
}

/// The client's request to place a character: a position and a rotation,
/// no owner (the server knows who sent it).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
pub struct CharacterPlacement {
    #[serde(rename = "pos")]
    pub position: Position,
    pub rotation: i32,
}

// ---------------------------------------------------------------------------
// Lobby types
// ---------------------------------------------------------------------------

/// One player's entry in the lobby, as sent in `LOBBY_DATA`.
///
/// The server produces these wholesale. The client never builds or edits
/// one; it only stores whatever the latest snapshot says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub is_ready: bool,

    /// The server's lobby summary may leave this out; treat that as "no
    /// characters yet".
    #[serde(default)]
    pub characters: Vec<Character>,
}

/// The coarse phase of a session.
///
/// The server owns stage transitions and the client does not validate
/// them. Stages the client does not know about yet are kept verbatim in
/// [`Stage::Other`] rather than rejected, so a newer server can add
/// phases without breaking older clients.
///
/// On the wire a stage is a plain string (`"lobby"`, `"gameStarted"`).
/// `#[serde(from, into)]` routes (de)serialization through the `String`
/// conversions below.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    /// Players are gathering and readying up.
    #[default]
    Lobby,
    /// Every player readied up and the game is running.
    GameStarted,
    /// Any stage name this client does not recognize.
    Other(String),
}

impl Stage {
    /// Returns the wire name of this stage.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Lobby => "lobby",
            Self::GameStarted => "gameStarted",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Stage {
    fn from(name: String) -> Self {
        match name.as_str() {
            "lobby" => Self::Lobby,
            "gameStarted" => Self::GameStarted,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Stage {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Stage {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
