//! duorpc error code space, compatible with JSON-RPC 2.0.
//!
//! Codes in the `-32700..=-32600` range are the standard JSON-RPC codes; the
//! `-32000..=-32099` server range carries the duorpc-specific kinds.

/// Invalid wire data was received (malformed frame).
pub const PARSE_ERROR: i32 = -32700;
/// The frame decoded but is not a valid message.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist in the relevant schema, or has no handler.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Request params were rejected by the method's input validator.
pub const INVALID_PARAMS: i32 = -32602;
/// The handler failed, or produced output its own schema rejects.
pub const INTERNAL_ERROR: i32 = -32603;
/// A pending request's deadline elapsed before a reply arrived.
pub const TIMEOUT: i32 = -32000;
/// The transport was not open at send time, or the peer closed with the
/// request still pending.
pub const CONNECTION_CLOSED: i32 = -32001;
/// Outbound input was rejected by the local copy of the remote schema.
pub const VALIDATION_ERROR: i32 = -32002;
