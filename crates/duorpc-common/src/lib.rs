//! duorpc Common Types, Codecs, and Transport Contract
//!
//! This crate provides the shared protocol infrastructure for duorpc, a
//! bidirectional, schema-validated RPC protocol layered on message-framed
//! transports (nominally WebSocket).
//!
//! # Overview
//!
//! Every duorpc endpoint is symmetric: it exposes local methods and events and
//! may invoke remote ones over the same connection. This crate contains the
//! pieces both sides of a connection agree on:
//!
//! - **Protocol Layer**: the four-variant message union, error taxonomy, and
//!   JSON-RPC 2.0 compatible error codes
//! - **Codec Layer**: pluggable text (JSON) and binary (MessagePack, CBOR)
//!   encodings with an identical semantic surface
//! - **Schema Layer**: the validator contract consumed at every call edge,
//!   with a JSON Schema backed implementation
//! - **Transport Layer**: the message-duplex contract a peer consumes, plus an
//!   in-memory implementation for tests and in-process wiring
//!
//! # Wire Format
//!
//! The canonical JSON encoding uses a `type` discriminator field:
//!
//! ```text
//! {"type":"rpc:request","id":"1","method":"getUser","params":{"id":"123"}}
//! {"type":"rpc:response","id":"1","result":{"name":"J"}}
//! {"type":"rpc:error","id":"1","code":-32601,"message":"Method not found"}
//! {"type":"rpc:event","event":"userChanged","data":{"id":"123"}}
//! ```
//!
//! Binary codecs encode the same logical object shape with named fields.
//!
//! # Components
//!
//! - [`protocol`] - Message union, [`RpcError`](protocol::RpcError), error codes
//! - [`codec`] - [`Codec`](codec::Codec) over JSON / MessagePack / CBOR
//! - [`wire`] - [`Protocol`](wire::Protocol): typed frame construction and
//!   inbound frame normalization
//! - [`schema`] - [`Validate`](schema::Validate) contract and [`Schema`](schema::Schema)
//! - [`transport`] - [`Transport`](transport::Transport) contract and frames

pub mod codec;
pub mod protocol;
pub mod schema;
pub mod transport;
pub mod wire;

pub use codec::Codec;
pub use protocol::{codes, Message, RpcError};
pub use schema::{Schema, Validate};
pub use transport::{InboundFrame, ReadyState, Transport, WireFrame};
pub use wire::Protocol;
