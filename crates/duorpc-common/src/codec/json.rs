//! Canonical JSON text codec.

use crate::protocol::{CodecError, Message};

/// The canonical text codec.
///
/// This is the encoding the wire format section of the protocol is written
/// against; the binary codecs mirror its logical shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Encodes a message to its JSON text form.
    pub fn encode(&self, message: &Message) -> Result<String, CodecError> {
        Ok(serde_json::to_string(message)?)
    }

    /// Decodes a message from JSON text, validating it against the union.
    pub fn decode(&self, text: &str) -> Result<Message, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}
