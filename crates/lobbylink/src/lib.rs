//! # lobbylink
//!
//! Client core for realtime multiplayer lobbies.
//!
//! A [`LobbyClient`] keeps exactly one socket open to a lobby server,
//! announces the player with a `JOIN` handshake, and mirrors everything
//! the server pushes (identity, lobby roster, game stage) into a
//! [`GameState`] that any number of readers can watch. Outbound commands
//! go through an [`OutboundSender`] and are only written while connected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use lobbylink::prelude::*;
//!
//! # async fn run() -> Result<(), LobbyError> {
//! let client = LobbyClient::new(ClientConfig::from_env())?;
//! let mut state = client.subscribe();
//!
//! client.connect("Alice");
//! client.wait_for_status(ConnectionStatus::Connected, Duration::from_secs(5)).await?;
//! client.set_ready(true).await;
//!
//! while state.changed().await.is_ok() {
//!     let snapshot = state.borrow_and_update().clone();
//!     if snapshot.stage == Stage::GameStarted {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`lobbylink_transport`]: sockets ([`Connector`], [`Connection`])
//! - [`lobbylink_protocol`]: message vocabulary and the JSON codec
//! - [`lobbylink_state`]: [`GameState`], the reducer and the store

mod client;
mod config;
mod error;
mod event;
mod reconnect;
mod sender;
mod status;

pub use client::LobbyClient;
pub use config::{ClientConfig, DEFAULT_URL, URL_ENV_VAR};
pub use error::LobbyError;
pub use event::ClientEvent;
pub use reconnect::ReconnectPolicy;
pub use sender::OutboundSender;
pub use status::ConnectionStatus;

pub use lobbylink_protocol::{
    Character, CharacterPlacement, ClientMessage, Codec, Frame, JsonCodec,
    PlayerId, PlayerSnapshot, Position, ProtocolError, ServerMessage, Stage,
    WireMessage,
};
pub use lobbylink_state::{GameState, GameStateStore, reduce};
pub use lobbylink_transport::{
    Connection, ConnectionId, Connector, TransportError, WebSocketConnection,
    WebSocketConnector,
};

/// Everything most applications need.
pub mod prelude {
    pub use crate::{
        ClientConfig, ClientEvent, ClientMessage, ConnectionStatus,
        GameState, LobbyClient, LobbyError, OutboundSender, PlayerId,
        PlayerSnapshot, Position, ReconnectPolicy, Stage,
    };
}
