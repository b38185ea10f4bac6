//! Lifecycle notifications from the supervisor to the host.

use std::sync::Arc;

use serde_json::Value;

use duorpc_common::protocol::RpcError;
use duorpc_common::transport::Transport;
use duorpc_peer::Peer;

/// Host-side observers of fleet lifecycle.
///
/// All methods default to no-ops; implement only what the host cares about.
/// Hooks run synchronously on the supervisor's task, so they must be cheap —
/// heavy work belongs on a channel.
#[allow(unused_variables)]
pub trait FleetHooks: Send + Sync {
    /// A peer was accepted into the fleet.
    fn on_connect(&self, peer: &Arc<Peer>) {}

    /// A peer was closed and removed from the fleet.
    fn on_disconnect(&self, peer: &Arc<Peer>) {}

    /// A validated inbound event arrived on a peer.
    fn on_event(&self, peer: &Arc<Peer>, event: &str, data: &Value) {}

    /// Something failed outside a caller's future (for example a broadcast
    /// send). `peer_id` is `None` for fleet-level failures.
    fn on_error(&self, peer_id: Option<&str>, error: &RpcError) {}

    /// The whole fleet shut down.
    fn on_close(&self) {}

    /// A peer was lazily recreated for a connection id the supervisor did
    /// not know — the hibernation recovery path.
    fn on_peer_recreated(&self, peer: &Arc<Peer>, transport: &Arc<dyn Transport>) {}
}

/// The do-nothing hook set.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl FleetHooks for NoopHooks {}
