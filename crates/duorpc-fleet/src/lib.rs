//! duorpc Multi-Peer Supervision
//!
//! A [`MultiPeer`] fronts N peers behind a single call surface. It owns the
//! peer map (keyed by an opaque connection id), scatter-gathers calls across
//! any subset of open peers with per-call timeouts, broadcasts events with
//! optional addressing, and notifies the host of lifecycle transitions
//! through [`FleetHooks`].
//!
//! # Lazy Recreation
//!
//! When the embedding runtime reports a frame on a connection id the
//! supervisor does not know, the peer is recreated on the spot through the
//! configured [`PeerFactory`], `on_peer_recreated` fires, and the frame is
//! dispatched to the new peer. This is how durable continuations reach their
//! callbacks after a hibernation cycle: the factory builds the durable
//! layering over the recreated peer, and the stored calls complete as if the
//! process had never been suspended.
//!
//! # Fan-out Semantics
//!
//! For a call with explicit targets `[a, b, c]`, the result vector contains
//! exactly one entry per **open** peer in that set at call time; closed or
//! unknown ids are omitted. Entries preserve target-resolution order, and
//! each per-peer call is raced against the fan-out timeout independently.

pub mod factory;
pub mod fleet;
pub mod hooks;

pub use factory::{FleetMember, PeerFactory, StandardPeerFactory};
pub use fleet::{CallOptions, CallTargets, FanoutEntry, MultiPeer, MultiPeerConfig};
pub use hooks::{FleetHooks, NoopHooks};
