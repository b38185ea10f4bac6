//! Pluggable message codecs.
//!
//! A codec is a bidirectional mapping between a validated [`Message`] and its
//! wire representation. One text codec (JSON) and two binary codecs
//! (MessagePack, CBOR) are supported; all three carry the identical logical
//! object shape, so switching codecs never changes protocol semantics.
//!
//! Decoding always validates against the message union: a frame that parses
//! but does not match one of the four variants is a [`CodecError`].
//!
//! # Example
//!
//! ```
//! use duorpc_common::codec::Codec;
//! use duorpc_common::{Message, WireFrame};
//! use serde_json::json;
//!
//! let codec = Codec::json();
//! let message = Message::event("tick", json!({"seq": 1}));
//!
//! let frame = codec.encode(&message).unwrap();
//! assert!(matches!(frame, WireFrame::Text(_)));
//! ```

mod cbor;
mod json;
mod msgpack;

pub use cbor::CborCodec;
pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

use crate::protocol::{CodecError, Message};
use crate::transport::WireFrame;

/// The selected wire encoding for a connection.
///
/// Both ends of a connection must agree on the codec out of band; nothing in
/// the protocol negotiates it.
#[derive(Debug, Clone)]
pub enum Codec {
    /// Canonical text encoding.
    Json(JsonCodec),
    /// Compact binary encoding, field names preserved.
    MsgPack(MsgPackCodec),
    /// Compact binary encoding, field names preserved.
    Cbor(CborCodec),
}

impl Codec {
    /// The JSON text codec.
    pub fn json() -> Self {
        Codec::Json(JsonCodec)
    }

    /// The MessagePack binary codec.
    pub fn msgpack() -> Self {
        Codec::MsgPack(MsgPackCodec)
    }

    /// The CBOR binary codec.
    pub fn cbor() -> Self {
        Codec::Cbor(CborCodec)
    }

    /// True for codecs whose native wire shape is bytes rather than text.
    pub fn is_binary(&self) -> bool {
        !matches!(self, Codec::Json(_))
    }

    /// Encodes a message into its native frame shape for this codec.
    pub fn encode(&self, message: &Message) -> Result<WireFrame, CodecError> {
        match self {
            Codec::Json(c) => Ok(WireFrame::Text(c.encode(message)?)),
            Codec::MsgPack(c) => Ok(WireFrame::Binary(c.encode(message)?)),
            Codec::Cbor(c) => Ok(WireFrame::Binary(c.encode(message)?)),
        }
    }

    /// Decodes a message from text input.
    ///
    /// For the binary codecs the text is re-encoded as UTF-8 bytes first, per
    /// the frame normalization contract.
    pub fn decode_text(&self, text: &str) -> Result<Message, CodecError> {
        match self {
            Codec::Json(c) => c.decode(text),
            Codec::MsgPack(c) => c.decode(text.as_bytes()),
            Codec::Cbor(c) => c.decode(text.as_bytes()),
        }
    }

    /// Decodes a message from binary input.
    ///
    /// For the text codec the bytes are decoded as UTF-8 first, per the frame
    /// normalization contract.
    pub fn decode_binary(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        match self {
            Codec::Json(c) => {
                let text = String::from_utf8(bytes.to_vec())?;
                c.decode(&text)
            }
            Codec::MsgPack(c) => c.decode(bytes),
            Codec::Cbor(c) => c.decode(bytes),
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::json()
    }
}
