//! duorpc error taxonomy.
//!
//! Every failure a call edge can produce is a variant of [`RpcError`]; control
//! flow uses these sum types rather than panics, and only truly unexpected
//! conditions unwind. Codec-level failures have their own [`CodecError`] so the
//! decode path can be handled (logged and dropped) without surfacing to callers.

use serde_json::Value;
use thiserror::Error;

use crate::protocol::codes;
use crate::schema::Issue;
use crate::transport::TransportError;

/// Result alias used across the duorpc crates.
pub type Result<T> = std::result::Result<T, RpcError>;

/// Everything that can fail on a duorpc call edge.
///
/// Outbound call failures reject the caller's future with one of these.
/// Inbound handler failures never surface locally; they are transformed into
/// `rpc:error` frames for the remote side instead.
///
/// Each variant maps to a stable numeric code via [`RpcError::code`], matching
/// the wire-level code space in [`codes`].
#[derive(Debug, Error)]
pub enum RpcError {
    /// The transport was not open at send time, or the peer closed while this
    /// request was pending. Expected and retryable from the caller's side.
    #[error("connection closed")]
    ConnectionClosed,

    /// The method is absent from the relevant schema.
    #[error("method '{method}' not found")]
    MethodNotFound {
        /// The method that was looked up.
        method: String,
    },

    /// A validator rejected a value before it reached the wire.
    #[error("validation failed for '{context}'")]
    Validation {
        /// What was being validated (method or event name).
        context: String,
        /// The validator's issues, carried as error data.
        issues: Vec<Issue>,
    },

    /// A pending request's deadline elapsed. Expected and retryable.
    #[error("request '{method}' timed out after {timeout_ms}ms")]
    Timeout {
        /// The method that was awaiting a reply.
        method: String,
        /// The deadline that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// The remote side answered this request with an `rpc:error` frame.
    /// Terminal for the call; retrying is the caller's choice.
    #[error("remote error {code} from '{method}': {message}")]
    Remote {
        /// The method that was invoked.
        method: String,
        /// The remote-reported code.
        code: i32,
        /// The remote-reported message.
        message: String,
        /// Optional remote-reported detail.
        data: Option<Value>,
    },

    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The transport rejected a send.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl RpcError {
    /// The wire-level code for this error kind.
    pub fn code(&self) -> i32 {
        match self {
            RpcError::ConnectionClosed => codes::CONNECTION_CLOSED,
            RpcError::MethodNotFound { .. } => codes::METHOD_NOT_FOUND,
            RpcError::Validation { .. } => codes::VALIDATION_ERROR,
            RpcError::Timeout { .. } => codes::TIMEOUT,
            RpcError::Remote { code, .. } => *code,
            RpcError::Codec(_) => codes::PARSE_ERROR,
            RpcError::Transport(_) => codes::CONNECTION_CLOSED,
        }
    }

    /// True for the expected, retryable failures (timeouts and closed
    /// connections). Remote errors are terminal for the call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RpcError::Timeout { .. } | RpcError::ConnectionClosed | RpcError::Transport(_)
        )
    }
}

/// Encode/decode failures at the codec layer.
///
/// Decode failures on inbound frames are logged and dropped by the peer; they
/// must never close the transport.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Malformed JSON, or JSON that does not match the message union.
    #[error("invalid JSON frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed MessagePack, or a shape mismatch against the message union.
    #[error("invalid MessagePack frame: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// MessagePack encoding failed.
    #[error("MessagePack encoding failed: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// Malformed CBOR, or a shape mismatch against the message union.
    #[error("invalid CBOR frame: {0}")]
    CborDecode(#[from] ciborium::de::Error<std::io::Error>),

    /// CBOR encoding failed.
    #[error("CBOR encoding failed: {0}")]
    CborEncode(#[from] ciborium::ser::Error<std::io::Error>),

    /// A binary frame arrived for the text codec but is not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
