//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between typed frames and the text
//! that travels over the socket. The client never touches JSON directly:
//! it hands a [`Frame`] to the codec and gets a `String` back, or the
//! other way round.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Frame, ProtocolError, WireMessage};

/// A codec that turns frames into text and back.
///
/// `Send + Sync + 'static` because the client shares one codec between
/// the connection task and every outbound sender.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a frame into one text frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload cannot be
    /// represented. This does not happen for the built-in vocabularies.
    fn encode<M: WireMessage>(
        &self,
        frame: &Frame<M>,
    ) -> Result<String, ProtocolError>;

    /// Parses one text frame.
    ///
    /// # Errors
    /// - `ProtocolError::Decode`: not a well-formed frame object.
    /// - `ProtocolError::UnknownType`: `type` outside the vocabulary.
    /// - `ProtocolError::InvalidPayload`: payload of the wrong shape.
    fn decode<M: WireMessage>(
        &self,
        text: &str,
    ) -> Result<Frame<M>, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// Outgoing frame shape. Borrows the tag so encoding allocates only the
/// payload.
#[derive(Serialize)]
struct OutFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
}

/// Incoming frame shape. Unknown top-level keys are ignored.
#[derive(Deserialize)]
struct InFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    timestamp: Option<u64>,
}

/// A [`Codec`] that speaks the JSON wire format.
///
/// ## Example
///
/// ```rust
/// use lobbylink_protocol::{Codec, Frame, JsonCodec, ServerMessage};
///
/// let codec = JsonCodec;
///
/// let frame: Frame<ServerMessage> = codec
///     .decode(r#"{"type":"JOINED","payload":{"playerId":"p1"}}"#)
///     .unwrap();
/// assert_eq!(frame.message, ServerMessage::joined("p1"));
/// assert_eq!(frame.timestamp, None);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<M: WireMessage>(
        &self,
        frame: &Frame<M>,
    ) -> Result<String, ProtocolError> {
        let out = OutFrame {
            kind: frame.message.kind(),
            payload: frame.message.to_payload().map_err(ProtocolError::Encode)?,
            timestamp: frame.timestamp,
        };
        serde_json::to_string(&out).map_err(ProtocolError::Encode)
    }

    fn decode<M: WireMessage>(
        &self,
        text: &str,
    ) -> Result<Frame<M>, ProtocolError> {
        let raw: InFrame =
            serde_json::from_str(text).map_err(ProtocolError::Decode)?;
        let message = M::from_parts(&raw.kind, raw.payload)?;
        Ok(Frame {
            message,
            timestamp: raw.timestamp,
        })
    }
}
