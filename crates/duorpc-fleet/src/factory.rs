//! Peer construction for accept and lazy recreation.

use std::sync::Arc;
use std::time::Duration;

use duorpc_common::schema::Schema;
use duorpc_common::transport::Transport;
use duorpc_common::wire::Protocol;
use duorpc_peer::{MessageSink, Peer, PeerConfig, Provider};

/// One supervised connection: the peer the fleet drives calls and emits on,
/// and the sink its inbound frames flow through.
///
/// For a plain peer the two are the same object. A durable layering returns
/// the inner peer as `peer` and the durable wrapper as `sink`, so completion
/// interception happens without the supervisor knowing about it.
pub struct FleetMember {
    /// The call/emit surface.
    pub peer: Arc<Peer>,
    /// The inbound frame route.
    pub sink: Arc<dyn MessageSink>,
}

impl FleetMember {
    /// A member whose sink is the peer itself.
    pub fn plain(peer: Arc<Peer>) -> Self {
        Self {
            sink: peer.clone(),
            peer,
        }
    }
}

/// Builds a member for a connection id and transport handle.
///
/// Used on explicit accept and on lazy recreation after hibernation; the two
/// paths must produce identically-wired members.
pub trait PeerFactory: Send + Sync {
    /// Builds the member for one connection.
    fn build(&self, connection_id: &str, transport: Arc<dyn Transport>) -> FleetMember;
}

/// The default factory: plain peers sharing one schema pair and provider.
pub struct StandardPeerFactory {
    protocol: Protocol,
    local_schema: Arc<Schema>,
    remote_schema: Arc<Schema>,
    provider: Arc<Provider>,
    default_timeout: Duration,
}

impl StandardPeerFactory {
    /// Creates a factory stamping out peers with the given shared parts.
    pub fn new(
        protocol: Protocol,
        local_schema: Arc<Schema>,
        remote_schema: Arc<Schema>,
        provider: Arc<Provider>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            protocol,
            local_schema,
            remote_schema,
            provider,
            default_timeout,
        }
    }
}

impl PeerFactory for StandardPeerFactory {
    fn build(&self, connection_id: &str, transport: Arc<dyn Transport>) -> FleetMember {
        let peer = Arc::new(Peer::with_config(
            transport,
            self.protocol.clone(),
            self.local_schema.clone(),
            self.remote_schema.clone(),
            self.provider.clone(),
            PeerConfig {
                id: Some(connection_id.to_string()),
                default_timeout_ms: self.default_timeout.as_millis() as u64,
            },
        ));
        FleetMember::plain(peer)
    }
}
