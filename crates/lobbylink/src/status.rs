//! Connection status and its state machine.

use std::fmt;

/// Where the client's single socket currently is in its lifecycle.
///
/// ```text
///   Disconnected ──(connect)──→ Connecting ──(open)──→ Connected
///        ↑                          │                      │
///        └────────(error)───────────┘                      │
///        └─────────────────(close | error)─────────────────┘
/// ```
///
/// A dropped connection is terminal: nothing goes from `Connected` back
/// to `Connecting`. Calling `connect` again starts over from
/// `Disconnected` with a fresh socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionStatus {
    /// Returns `true` if moving from `self` to `target` is a legal step.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Disconnected, Self::Connecting)
                | (Self::Connecting, Self::Connected)
                | (Self::Connecting, Self::Disconnected)
                | (Self::Connected, Self::Disconnected)
        )
    }

    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}
