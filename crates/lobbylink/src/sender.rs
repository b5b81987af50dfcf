//! Outbound messages.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use lobbylink_protocol::{
    CharacterPlacement, ClientMessage, Codec, Frame, JsonCodec, Position,
    ProtocolError, WireMessage,
};
use lobbylink_transport::{Connection, Connector, WebSocketConnector};

use crate::client::Shared;

/// Sends [`ClientMessage`]s over the client's live socket.
///
/// Sending is fire-and-forget. If the client is not connected the message
/// is dropped with a warning (nothing is queued for later), and a failed
/// write is logged rather than returned. Whatever happens to the socket
/// surfaces through the connection status instead.
///
/// Cloning is cheap; every clone writes to whatever socket is live at the
/// time of the call.
pub struct OutboundSender<C: Connector = WebSocketConnector, K: Codec = JsonCodec> {
    shared: Arc<Shared<C, K>>,
}

impl<C: Connector, K: Codec> Clone for OutboundSender<C, K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connector, K: Codec> OutboundSender<C, K> {
    pub(crate) fn new(shared: Arc<Shared<C, K>>) -> Self {
        Self { shared }
    }

    pub async fn send(&self, message: ClientMessage) {
        let kind = message.kind();
        let Some(conn) = self.shared.live_connection() else {
            tracing::warn!(kind, "not connected, message dropped");
            return;
        };
        let conn_id = conn.id();

        let text = match self.shared.encode_outbound(message) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(%conn_id, kind, error = %e, "failed to encode message");
                return;
            }
        };

        match conn.send(&text).await {
            Ok(()) => tracing::debug!(%conn_id, kind, "message sent"),
            Err(e) => tracing::warn!(%conn_id, kind, error = %e, "failed to send message"),
        }
    }

    /// `READY_STATUS{status}`.
    pub async fn set_ready(&self, ready: bool) {
        self.send(ClientMessage::ready_status(ready)).await;
    }

    /// `ADD_CHARACTER{character: {pos, rotation}}`.
    pub async fn add_character(&self, position: Position, rotation: i32) {
        self.send(ClientMessage::add_character(CharacterPlacement {
            position,
            rotation,
        }))
        .await;
    }

    /// `CHOOSE{choice}`.
    pub async fn choose(&self, choice: impl Into<String>) {
        self.send(ClientMessage::choose(choice)).await;
    }

    /// `PING{}`.
    pub async fn ping(&self) {
        self.send(ClientMessage::ping()).await;
    }
}

impl<C: Connector, K: Codec> Shared<C, K> {
    /// Wraps `message` in a frame (stamped if configured) and encodes it.
    pub(crate) fn encode_outbound(
        &self,
        message: ClientMessage,
    ) -> Result<String, ProtocolError> {
        let frame = if self.config.stamp_outbound {
            Frame::stamped(message, unix_millis())
        } else {
            Frame::new(message)
        };
        self.codec.encode(&frame)
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}
