//! The multi-peer supervisor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, warn};

use duorpc_common::protocol::RpcError;
use duorpc_common::schema::Schema;
use duorpc_common::transport::{InboundFrame, Transport};
use duorpc_common::wire::Protocol;
use duorpc_peer::{Peer, Provider};

use crate::factory::{FleetMember, PeerFactory, StandardPeerFactory};
use crate::hooks::FleetHooks;

/// Supervisor construction options.
#[derive(Debug, Clone)]
pub struct MultiPeerConfig {
    /// Deadline each per-peer fan-out call is raced against when the call
    /// options carry none, in milliseconds.
    pub default_timeout_ms: u64,
}

impl Default for MultiPeerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 30_000,
        }
    }
}

/// Which peers a fan-out call or broadcast addresses.
#[derive(Debug, Clone)]
pub enum CallTargets {
    /// Exactly one connection id.
    One(String),
    /// An explicit list of connection ids, in result order.
    Many(Vec<String>),
}

/// Per-call fan-out options.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Target set; `None` addresses every open peer.
    pub targets: Option<CallTargets>,
    /// Per-peer race deadline; `None` uses the supervisor default.
    pub timeout: Option<Duration>,
}

impl CallOptions {
    /// Addresses a single peer.
    pub fn to(id: impl Into<String>) -> Self {
        Self {
            targets: Some(CallTargets::One(id.into())),
            timeout: None,
        }
    }

    /// Addresses an explicit list of peers.
    pub fn to_many<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: Some(CallTargets::Many(ids.into_iter().map(Into::into).collect())),
            timeout: None,
        }
    }

    /// Sets the per-peer race deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One peer's outcome in a fan-out call.
#[derive(Debug)]
pub struct FanoutEntry {
    /// The connection id this entry belongs to.
    pub peer_id: String,
    /// The peer's result or failure.
    pub result: Result<Value, RpcError>,
}

/// Fronts a set of peers behind a single call surface.
///
/// See the [crate docs](crate) for fan-out semantics and lazy recreation.
/// The supervisor owns its peers: closing it (or dropping it) closes every
/// peer. Transports are observed, never owned.
pub struct MultiPeer {
    members: Mutex<HashMap<String, FleetMember>>,
    factory: Arc<dyn PeerFactory>,
    hooks: Arc<dyn FleetHooks>,
    local_schema: Arc<Schema>,
    default_timeout: Duration,
    closed: AtomicBool,
}

impl MultiPeer {
    /// Creates a supervisor stamping out plain peers that share one protocol,
    /// schema pair, and provider.
    pub fn new(
        protocol: Protocol,
        local_schema: Arc<Schema>,
        remote_schema: Arc<Schema>,
        provider: Arc<Provider>,
        hooks: Arc<dyn FleetHooks>,
        config: MultiPeerConfig,
    ) -> Self {
        let default_timeout = Duration::from_millis(config.default_timeout_ms);
        let factory = Arc::new(StandardPeerFactory::new(
            protocol,
            local_schema.clone(),
            remote_schema,
            provider,
            default_timeout,
        ));
        Self::with_factory(factory, local_schema, hooks, config)
    }

    /// Creates a supervisor with a custom member factory.
    ///
    /// This is the durable-capable form: the factory layers a durable sink
    /// over each peer, and lazy recreation rebuilds that layering.
    pub fn with_factory(
        factory: Arc<dyn PeerFactory>,
        local_schema: Arc<Schema>,
        hooks: Arc<dyn FleetHooks>,
        config: MultiPeerConfig,
    ) -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            factory,
            hooks,
            local_schema,
            default_timeout: Duration::from_millis(config.default_timeout_ms),
            closed: AtomicBool::new(false),
        }
    }

    /// Admits a new connection into the fleet.
    ///
    /// An existing member under the same id is closed and replaced.
    pub fn accept(&self, connection_id: &str, transport: Arc<dyn Transport>) -> Arc<Peer> {
        let member = self.factory.build(connection_id, transport);
        self.wire_events(&member);
        let peer = member.peer.clone();
        let replaced = self
            .members
            .lock()
            .insert(connection_id.to_string(), member);
        if let Some(old) = replaced {
            warn!(connection = connection_id, "replacing existing fleet member");
            old.peer.close();
            self.hooks.on_disconnect(&old.peer);
        }
        self.hooks.on_connect(&peer);
        peer
    }

    /// Routes one inbound frame to the member for `connection_id`.
    ///
    /// A frame for an unknown connection lazily recreates the member from
    /// the factory (firing `on_peer_recreated`) before dispatching — the
    /// hibernation recovery path.
    pub async fn handle_message(
        &self,
        connection_id: &str,
        frame: InboundFrame,
        transport: Arc<dyn Transport>,
    ) {
        let existing = self
            .members
            .lock()
            .get(connection_id)
            .map(|member| member.sink.clone());

        let sink = match existing {
            Some(sink) => sink,
            None => {
                debug!(connection = connection_id, "recreating peer for unknown connection");
                let member = self.factory.build(connection_id, transport.clone());
                self.wire_events(&member);
                let peer = member.peer.clone();
                let sink = member.sink.clone();
                self.members
                    .lock()
                    .insert(connection_id.to_string(), member);
                self.hooks.on_peer_recreated(&peer, &transport);
                sink
            }
        };

        sink.handle_message(frame).await;
    }

    /// Invokes a method across the resolved target set in parallel.
    ///
    /// Each per-peer call is independently raced against the fan-out
    /// deadline. A call that loses the race is abandoned, not cancelled: it
    /// keeps running and settles on the peer's own terms. The returned vector
    /// holds one entry per open targeted peer, in target-resolution order.
    pub async fn call(&self, method: &str, params: Value, options: CallOptions) -> Vec<FanoutEntry> {
        let targets = self.resolve_targets(options.targets.as_ref());
        let timeout = options.timeout.unwrap_or(self.default_timeout);

        let calls = targets.into_iter().map(|(peer_id, peer)| {
            let params = params.clone();
            let method = method.to_string();
            async move {
                // The call runs on its own task: the fan-out deadline only
                // abandons the race, it never cancels the call future. The
                // peer settles its pending entry by its own rules (reply,
                // peer-level timeout, close) even after this slot gives up.
                let mut task = tokio::spawn({
                    let method = method.clone();
                    async move { peer.call(&method, params).await }
                });
                let result = match tokio::time::timeout(timeout, &mut task).await {
                    // A crashed call task counts as a closed connection.
                    Ok(joined) => joined.unwrap_or(Err(RpcError::ConnectionClosed)),
                    Err(_) => Err(RpcError::Timeout {
                        method,
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                FanoutEntry { peer_id, result }
            }
        });

        futures::future::join_all(calls).await
    }

    /// Broadcasts an event to the resolved target set.
    ///
    /// The data is validated once, then forwarded to each open targeted
    /// peer. Per-peer send failures are surfaced through `on_error`.
    pub fn emit(&self, event: &str, data: Value, targets: Option<&CallTargets>) {
        let Some(validator) = self.local_schema.event(event) else {
            warn!(event, "dropping broadcast of unknown event");
            return;
        };
        let data = match validator.validate(&data) {
            Ok(data) => data,
            Err(issues) => {
                warn!(
                    event,
                    issues = issues.len(),
                    "dropping broadcast of event with invalid data"
                );
                return;
            }
        };

        for (peer_id, peer) in self.resolve_targets(targets) {
            if let Err(err) = peer.forward_event(event, &data) {
                self.hooks.on_error(Some(&peer_id), &err);
            }
        }
    }

    /// Number of supervised connections.
    pub fn connection_count(&self) -> usize {
        self.members.lock().len()
    }

    /// Sorted connection ids.
    pub fn connection_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.members.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The peer for a connection id, if supervised.
    pub fn peer(&self, connection_id: &str) -> Option<Arc<Peer>> {
        self.members
            .lock()
            .get(connection_id)
            .map(|member| member.peer.clone())
    }

    /// Closes and removes one peer; returns whether it existed.
    pub fn close_peer(&self, connection_id: &str) -> bool {
        let member = self.members.lock().remove(connection_id);
        match member {
            Some(member) => {
                member.peer.close();
                self.hooks.on_disconnect(&member.peer);
                true
            }
            None => false,
        }
    }

    /// Closes every peer and fires `on_close`. Idempotent.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained: Vec<FleetMember> = self
            .members
            .lock()
            .drain()
            .map(|(_, member)| member)
            .collect();
        for member in &drained {
            member.peer.close();
            self.hooks.on_disconnect(&member.peer);
        }
        self.hooks.on_close();
    }

    /// Resolves the target set against currently-open peers, preserving
    /// explicit list order and using sorted id order for the all-peers case.
    fn resolve_targets(&self, targets: Option<&CallTargets>) -> Vec<(String, Arc<Peer>)> {
        let members = self.members.lock();
        let open = |id: &str| {
            members
                .get(id)
                .filter(|member| member.peer.is_open())
                .map(|member| (id.to_string(), member.peer.clone()))
        };
        match targets {
            None => {
                let mut ids: Vec<&String> = members.keys().collect();
                ids.sort();
                ids.into_iter().filter_map(|id| open(id)).collect()
            }
            Some(CallTargets::One(id)) => open(id).into_iter().collect(),
            Some(CallTargets::Many(ids)) => ids.iter().filter_map(|id| open(id)).collect(),
        }
    }

    fn wire_events(&self, member: &FleetMember) {
        let hooks = self.hooks.clone();
        let weak = Arc::downgrade(&member.peer);
        member.peer.set_event_handler(move |event, data| {
            if let Some(peer) = weak.upgrade() {
                hooks.on_event(&peer, event, data);
            }
        });
    }
}

impl Drop for MultiPeer {
    fn drop(&mut self) {
        self.close();
    }
}
