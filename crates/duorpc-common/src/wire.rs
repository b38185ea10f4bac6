//! Typed frame construction and inbound frame normalization.
//!
//! [`Protocol`] wraps a single [`Codec`] and is the only place wire bytes are
//! produced or consumed. Peers hold a `Protocol` as a plain constructor
//! parameter; there is no process-global default instance.

use tracing::debug;

use crate::codec::Codec;
use crate::protocol::{CodecError, Message};
use crate::transport::{InboundFrame, WireFrame};

use serde_json::Value;

/// Constructs and decodes wire frames for one connection.
///
/// # Frame Normalization
///
/// Inbound frames arrive as text, a single binary buffer, or a sequence of
/// binary chunks (fragmented frames). [`Protocol::decode_message`] normalizes
/// before decoding:
///
/// 1. a chunk sequence is concatenated into one buffer, preserving order;
/// 2. a binary frame for the text codec is decoded as UTF-8;
/// 3. a text frame for a binary codec is UTF-8-encoded to bytes;
/// 4. the normalized input goes to the codec's decode.
///
/// # Example
///
/// ```
/// use duorpc_common::codec::Codec;
/// use duorpc_common::wire::Protocol;
/// use duorpc_common::{InboundFrame, Message, WireFrame};
/// use serde_json::json;
///
/// let protocol = Protocol::new(Codec::json());
/// let WireFrame::Text(text) = protocol.request("1", "ping", &json!({})).unwrap() else {
///     unreachable!()
/// };
/// let message = protocol.decode_message(InboundFrame::Text(text)).unwrap();
/// assert!(matches!(message, Message::Request { .. }));
/// ```
#[derive(Debug, Clone)]
pub struct Protocol {
    codec: Codec,
}

impl Protocol {
    /// Creates a protocol over the given codec.
    pub fn new(codec: Codec) -> Self {
        Self { codec }
    }

    /// The underlying codec.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Builds an `rpc:request` frame.
    pub fn request(&self, id: &str, method: &str, params: &Value) -> Result<WireFrame, CodecError> {
        self.codec
            .encode(&Message::request(id, method, params.clone()))
    }

    /// Builds an `rpc:response` frame.
    pub fn response(&self, id: &str, result: &Value) -> Result<WireFrame, CodecError> {
        self.codec.encode(&Message::response(id, result.clone()))
    }

    /// Builds an `rpc:error` frame.
    pub fn error(
        &self,
        id: &str,
        code: i32,
        message: &str,
        data: Option<Value>,
    ) -> Result<WireFrame, CodecError> {
        self.codec.encode(&Message::error(id, code, message, data))
    }

    /// Builds an `rpc:event` frame.
    pub fn event(&self, event: &str, data: &Value) -> Result<WireFrame, CodecError> {
        self.codec.encode(&Message::event(event, data.clone()))
    }

    /// Normalizes and decodes an inbound frame.
    pub fn decode_message(&self, frame: InboundFrame) -> Result<Message, CodecError> {
        match frame {
            InboundFrame::Text(text) => self.codec.decode_text(&text),
            InboundFrame::Binary(bytes) => self.codec.decode_binary(&bytes),
            InboundFrame::Chunks(chunks) => {
                let buf: Vec<u8> = chunks.concat();
                self.codec.decode_binary(&buf)
            }
        }
    }

    /// Like [`decode_message`](Self::decode_message), but logs and swallows
    /// decode failures.
    ///
    /// This is the entry point the inbound dispatch path uses: a malformed
    /// frame is dropped, never surfaced, and must not close the transport.
    pub fn safe_decode_message(&self, frame: InboundFrame) -> Option<Message> {
        match self.decode_message(frame) {
            Ok(message) => Some(message),
            Err(err) => {
                debug!(error = %err, "dropping undecodable inbound frame");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chunked_frames_reassemble_in_order() {
        let protocol = Protocol::new(Codec::msgpack());
        let WireFrame::Binary(bytes) = protocol.event("tick", &json!({"seq": 9})).unwrap() else {
            panic!("msgpack frames are binary");
        };
        let mid = bytes.len() / 2;
        let frame = InboundFrame::Chunks(vec![bytes[..mid].to_vec(), bytes[mid..].to_vec()]);

        let message = protocol.decode_message(frame).unwrap();
        assert_eq!(message, Message::event("tick", json!({"seq": 9})));
    }

    #[test]
    fn test_chunk_reordering_breaks_decode() {
        let protocol = Protocol::new(Codec::cbor());
        let WireFrame::Binary(bytes) = protocol.response("1", &json!([1, 2, 3])).unwrap() else {
            panic!("cbor frames are binary");
        };
        let mid = bytes.len() / 2;
        let frame = InboundFrame::Chunks(vec![bytes[mid..].to_vec(), bytes[..mid].to_vec()]);
        assert!(protocol.decode_message(frame).is_err());
    }

    #[test]
    fn test_text_frame_for_binary_codec() {
        // A binary codec receiving a text frame sees its UTF-8 bytes. The
        // msgpack decoder then rejects the JSON text, which is the expected
        // structural failure, not a panic.
        let protocol = Protocol::new(Codec::msgpack());
        let frame = InboundFrame::Text("{\"type\":\"rpc:event\"}".into());
        assert!(protocol.decode_message(frame).is_err());
    }

    #[test]
    fn test_binary_frame_for_text_codec() {
        let protocol = Protocol::new(Codec::json());
        let wire = r#"{"type":"rpc:event","event":"tick","data":null}"#;
        let message = protocol
            .decode_message(InboundFrame::Binary(wire.as_bytes().to_vec()))
            .unwrap();
        assert_eq!(message, Message::event("tick", json!(null)));
    }

    #[test]
    fn test_safe_decode_swallows_garbage() {
        let protocol = Protocol::new(Codec::json());
        assert!(protocol
            .safe_decode_message(InboundFrame::Text("not json".into()))
            .is_none());
    }
}
