//! MessagePack binary codec.

use crate::protocol::{CodecError, Message};

/// MessagePack binary codec.
///
/// Encoding uses `rmp_serde::to_vec_named` so field names survive on the wire
/// and the logical object shape stays identical to the JSON encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl MsgPackCodec {
    /// Encodes a message to MessagePack bytes.
    pub fn encode(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        Ok(rmp_serde::to_vec_named(message)?)
    }

    /// Decodes a message from MessagePack bytes, validating it against the
    /// union.
    pub fn decode(&self, bytes: &[u8]) -> Result<Message, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_names_survive_encoding() {
        let bytes = MsgPackCodec
            .encode(&Message::request("1", "ping", json!({})))
            .unwrap();
        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.contains("rpc:request"));
        assert!(raw.contains("method"));
    }

    #[test]
    fn test_garbage_input_is_rejected() {
        assert!(matches!(
            MsgPackCodec.decode(&[0xc1, 0x00]).unwrap_err(),
            CodecError::MsgPackDecode(_)
        ));
    }
}
