//! CBOR binary codec.

use crate::protocol::{CodecError, Message};

/// CBOR binary codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl CborCodec {
    /// Encodes a message to CBOR bytes.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(message, &mut buf)?;
        Ok(buf)
    }

    /// Decodes a message from CBOR bytes, validating it against the union.
    pub fn decode(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        Ok(ciborium::de::from_reader(bytes)?)
    }
}
