//! Unified error type for the lobbylink client.

use std::time::Duration;

use lobbylink_protocol::ProtocolError;
use lobbylink_transport::TransportError;

/// Top-level error that wraps the sub-crate errors.
///
/// Most client operations never return an error at all: connection
/// failures surface as a status change and protocol failures are logged.
/// This type shows up where a caller explicitly asks for an outcome
/// (building a client, waiting for a status, running a reconnect loop)
/// and inside the connection task, where `?` converts sub-crate errors
/// through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// A socket-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The [`ClientConfig`](crate::ClientConfig) was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The reconnect loop hit its attempt limit.
    #[error("gave up reconnecting after {attempts} failed attempts")]
    ReconnectExhausted { attempts: u32 },

    /// The client was dropped while an operation was waiting on it.
    #[error("client shut down")]
    Shutdown,
}
