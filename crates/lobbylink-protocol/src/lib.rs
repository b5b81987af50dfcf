//! Wire protocol for lobbylink.
//!
//! This crate defines the "language" the lobby client and server speak:
//!
//! - **Types** ([`PlayerId`], [`PlayerSnapshot`], [`Stage`], etc.): the
//!   data carried inside message payloads.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`Frame`]): the
//!   two closed vocabularies and the frame that wraps one message.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames become text
//!   and back.
//! - **Errors** ([`ProtocolError`]): what can go wrong in between.
//!
//! # Architecture
//!
//! The protocol layer sits between the socket (text frames) and the
//! client state (typed messages). It knows nothing about connections.
//!
//! ```text
//! Transport (text) → Protocol (Frame<ServerMessage>) → State (GameState)
//! ```

mod codec;
mod error;
mod messages;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use messages::{
    AddCharacterPayload, ChoosePayload, ClientMessage, Empty, ErrorPayload,
    Frame, GameStagePayload, JoinPayload, JoinedPayload, LobbyDataPayload,
    ReadyStatusPayload, ServerMessage, WireMessage,
};
pub use types::{
    Character, CharacterPlacement, PlayerId, PlayerSnapshot, Position, Stage,
};
