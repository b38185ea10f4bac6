//! duorpc Durable Calls
//!
//! Peer specialization for environments where the process may be suspended
//! (hibernated) with the transport still open. A normal outbound call holds
//! its continuation in memory; hibernation discards that memory while replies
//! can still arrive afterwards. Durable calls solve this by persisting the
//! pending state to synchronous external storage and routing the eventual
//! completion to a **named** callback, so a freshly constructed peer sharing
//! the same storage and callback registry can finish calls an earlier
//! incarnation started.
//!
//! # Ordering Contract
//!
//! [`DurablePeer::call_with_callback`] persists the pending call **before**
//! sending the request frame. A crash or hibernation between persist and send
//! is recoverable (the row is found by the maintenance operations and can be
//! retried); the reverse ordering would lose the continuation.
//!
//! # Components
//!
//! - [`DurablePeer`]: composition over [`Peer`](duorpc_peer::Peer) adding
//!   persisted calls and completion routing
//! - [`PendingCallStorage`]: the synchronous storage contract, with
//!   [`MemoryCallStorage`] and [`SqliteCallStorage`] backends
//! - [`CallbackRegistry`]: named continuations surviving process restarts
//! - [`Clock`]: millisecond wall-clock abstraction, steerable in tests

pub mod call;
pub mod clock;
pub mod peer;
pub mod registry;
pub mod storage;

pub use call::PendingCall;
pub use clock::{Clock, ManualClock, SystemClock};
pub use peer::{DurableError, DurablePeer};
pub use registry::{CallbackContext, CallbackPayload, CallbackRegistry};
pub use storage::{MemoryCallStorage, PendingCallStorage, SqliteCallStorage, StorageError};
