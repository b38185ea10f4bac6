//! duorpc Peer
//!
//! One endpoint of a symmetric duorpc connection. A peer simultaneously:
//!
//! - invokes remote methods ([`Peer::call`], or the [`Driver`] facade) with
//!   input validation, correlation, and per-call timeouts
//! - serves local methods registered in a [`Provider`], validating inbound
//!   params and its own output before replying
//! - emits and receives fire-and-forget events
//!
//! # Call Flow
//!
//! An outbound call validates its input against the remote schema, registers a
//! pending entry keyed by a fresh correlation id, encodes the request through
//! the connection's [`Protocol`](duorpc_common::Protocol), and sends it on the
//! transport. The pending entry is settled by exactly one of: a matching
//! response, a matching error frame, the call's deadline, or [`Peer::close`].
//!
//! # Concurrency Model
//!
//! A peer is single-threaded cooperative: inbound dispatch, handler
//! invocation, deadlines, and close all serialize on the embedding task
//! context. Internal state lives behind short mutex sections that are never
//! held across an await, so the peer is safe to share behind an `Arc` — but
//! the protocol-level ordering guarantees only hold when one task drives
//! inbound frames.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use duorpc_common::codec::Codec;
//! use duorpc_common::schema::{AnyValidator, Schema};
//! use duorpc_common::transport::MemoryTransport;
//! use duorpc_common::Protocol;
//! use duorpc_peer::{Peer, Provider};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = Schema::builder()
//!     .method("getUser", AnyValidator, AnyValidator)
//!     .build();
//!
//! let peer = Arc::new(Peer::new(
//!     MemoryTransport::open(),
//!     Protocol::new(Codec::json()),
//!     Schema::empty(),
//!     remote,
//!     Arc::new(Provider::new()),
//! ));
//!
//! let user = peer.call("getUser", json!({"id": "123"})).await?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod peer;
pub mod provider;
pub mod sink;

pub use driver::Driver;
pub use peer::{Peer, PeerConfig};
pub use provider::{HandlerError, Provider};
pub use sink::MessageSink;
