//! Error types for the protocol layer.
//!
//! Each lobbylink crate defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning frames into messages (or
//! back), not in the socket or the client state.

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a message into a text frame).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The frame is not a JSON object of the form
    /// `{"type": ..., "payload": ..., "timestamp"?: ...}`.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The frame's `type` is not part of the vocabulary.
    #[error("unknown message type {0:?}")]
    UnknownType(String),

    /// The `type` is known but the payload has the wrong shape
    /// (missing fields, wrong JSON types).
    #[error("invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// `true` when the frame was well formed but carried a `type` this
    /// client does not understand.
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }
}
