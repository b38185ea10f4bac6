//! duorpc Protocol Definitions
//!
//! This module defines the core protocol types for duorpc: the four-variant
//! message union, the error taxonomy, and the JSON-RPC 2.0 compatible error
//! code space.
//!
//! # Protocol Types
//!
//! - **[`Message`]**: the tagged wire union (request / response / error / event)
//! - **[`RpcError`]**: everything that can fail on a call edge, one variant per
//!   error kind, each carrying its diagnostic payload
//! - **[`codes`]**: the numeric error code space shared with the remote side
//!
//! # Correlation
//!
//! Request/response correlation uses opaque string ids chosen by the sender;
//! receivers echo them verbatim. Events carry no id and are never acknowledged.

pub mod codes;
pub mod error;
pub mod message;


pub use error::{CodecError, Result, RpcError};
pub use message::Message;
