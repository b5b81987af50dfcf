//! Notifications the client emits besides state snapshots.

use crate::ConnectionStatus;

/// Things that happened on the connection that are not part of
/// [`GameState`](lobbylink_state::GameState).
///
/// Delivered on a `tokio::sync::broadcast` channel from
/// [`LobbyClient::events`](crate::LobbyClient::events). Slow receivers
/// lag and lose the oldest events rather than slowing the socket down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The connection status moved.
    StatusChanged(ConnectionStatus),

    /// The server sent an `ERROR` message.
    ServerError(String),

    /// An inbound frame was dropped because it could not be decoded.
    ProtocolError(String),
}
