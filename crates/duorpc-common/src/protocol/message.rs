//! The duorpc wire message union.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single duorpc wire message.
///
/// The union has exactly four variants, discriminated by a `type` field on the
/// wire. Payload fields (`params`, `result`, `data`) are opaque at this layer:
/// they are validated by schema at the peer boundary and transported unchanged.
///
/// # Wire Shape
///
/// The canonical JSON encoding:
///
/// ```text
/// {"type":"rpc:request","id":"<string>","method":"<string>","params":<any>}
/// {"type":"rpc:response","id":"<string>","result":<any>}
/// {"type":"rpc:error","id":"<string>","code":<int>,"message":"<string>","data":<any?>}
/// {"type":"rpc:event","event":"<string>","data":<any>}
/// ```
///
/// Binary codecs (MessagePack, CBOR) encode the same logical object shape.
///
/// # Example
///
/// ```
/// use duorpc_common::Message;
/// use serde_json::json;
///
/// let request = Message::request("1", "getUser", json!({"id": "123"}));
/// let wire = serde_json::to_string(&request).unwrap();
/// assert!(wire.contains("\"type\":\"rpc:request\""));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// An invocation of a remote method, awaiting a correlated reply.
    #[serde(rename = "rpc:request")]
    Request {
        /// Correlation token chosen by the sender; echoed verbatim in the reply.
        id: String,
        /// Name of the method to invoke.
        method: String,
        /// Method input, validated against the method's input schema.
        params: Value,
    },

    /// The successful reply to a request.
    #[serde(rename = "rpc:response")]
    Response {
        /// Correlation token copied from the originating request.
        id: String,
        /// Method output, validated on the responder's side before sending.
        result: Value,
    },

    /// The failure reply to a request.
    #[serde(rename = "rpc:error")]
    Error {
        /// Correlation token copied from the originating request.
        id: String,
        /// Numeric error code, see [`codes`](super::codes).
        code: i32,
        /// Short human-readable description.
        message: String,
        /// Optional structured detail (validator issues, handler context).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },

    /// A fire-and-forget notification. No id, no acknowledgement.
    #[serde(rename = "rpc:event")]
    Event {
        /// Name of the event.
        event: String,
        /// Event payload, validated against the event's data schema.
        data: Value,
    },
}

impl Message {
    /// Creates a request message.
    pub fn request(id: impl Into<String>, method: impl Into<String>, params: Value) -> Self {
        Message::Request {
            id: id.into(),
            method: method.into(),
            params,
        }
    }

    /// Creates a response message.
    pub fn response(id: impl Into<String>, result: Value) -> Self {
        Message::Response {
            id: id.into(),
            result,
        }
    }

    /// Creates an error message.
    pub fn error(
        id: impl Into<String>,
        code: i32,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        Message::Error {
            id: id.into(),
            code,
            message: message.into(),
            data,
        }
    }

    /// Creates an event message.
    pub fn event(event: impl Into<String>, data: Value) -> Self {
        Message::Event {
            event: event.into(),
            data,
        }
    }

    /// The correlation id, for the three correlated variants.
    ///
    /// Events carry no id and return `None`.
    pub fn id(&self) -> Option<&str> {
        match self {
            Message::Request { id, .. }
            | Message::Response { id, .. }
            | Message::Error { id, .. } => Some(id),
            Message::Event { .. } => None,
        }
    }
}
