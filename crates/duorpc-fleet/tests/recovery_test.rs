//! Hibernation recovery through the supervisor.
//!
//! The durable-capable fleet wires a `DurablePeer` sink over each member via
//! a custom factory. These tests simulate a full suspend/resume cycle: the
//! first fleet issues a durable call and is dropped, a second fleet sharing
//! the same storage and callback registry receives the completion on a
//! connection id it has never seen, and the continuation still runs.

use std::sync::{Arc, Mutex};

use serde_json::json;

use duorpc_common::codec::Codec;
use duorpc_common::schema::{AnyValidator, Schema};
use duorpc_common::transport::{InboundFrame, MemoryTransport, Transport};
use duorpc_common::wire::Protocol;
use duorpc_durable::{
    CallbackPayload, CallbackRegistry, DurablePeer, ManualClock, MemoryCallStorage,
    PendingCallStorage,
};
use duorpc_fleet::{FleetHooks, FleetMember, MultiPeer, MultiPeerConfig, PeerFactory};
use duorpc_peer::{Peer, PeerConfig, Provider};

/// Builds members whose inbound route is a `DurablePeer` over shared storage
/// and callbacks. Keeps the last-built durable layer reachable so tests can
/// issue durable calls on it.
struct DurableFactory {
    protocol: Protocol,
    schema: Arc<Schema>,
    provider: Arc<Provider>,
    storage: Arc<dyn PendingCallStorage>,
    callbacks: Arc<CallbackRegistry>,
    clock: Arc<ManualClock>,
    last_built: Mutex<Option<Arc<DurablePeer>>>,
}

/// `RUST_LOG`-driven logging for debugging test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

impl DurableFactory {
    fn new(
        storage: Arc<dyn PendingCallStorage>,
        callbacks: Arc<CallbackRegistry>,
        clock: Arc<ManualClock>,
    ) -> Self {
        init_tracing();
        Self {
            protocol: Protocol::new(Codec::json()),
            schema: Schema::builder()
                .method("remoteMethod", AnyValidator, AnyValidator)
                .build(),
            provider: Arc::new(Provider::new()),
            storage,
            callbacks,
            clock,
            last_built: Mutex::new(None),
        }
    }

    fn last_built(&self) -> Arc<DurablePeer> {
        self.last_built.lock().unwrap().clone().expect("a member was built")
    }
}

impl PeerFactory for DurableFactory {
    fn build(&self, connection_id: &str, transport: Arc<dyn Transport>) -> FleetMember {
        let peer = Arc::new(Peer::with_config(
            transport,
            self.protocol.clone(),
            self.schema.clone(),
            self.schema.clone(),
            self.provider.clone(),
            PeerConfig {
                id: Some(connection_id.to_string()),
                ..PeerConfig::default()
            },
        ));
        let durable = Arc::new(DurablePeer::with_clock(
            peer.clone(),
            self.storage.clone(),
            self.callbacks.clone(),
            self.clock.clone(),
        ));
        *self.last_built.lock().unwrap() = Some(durable.clone());
        FleetMember {
            peer,
            sink: durable,
        }
    }
}

fn durable_fleet(factory: Arc<DurableFactory>) -> MultiPeer {
    let schema = factory.schema.clone();
    MultiPeer::with_factory(
        factory,
        schema,
        Arc::new(NoHooks),
        MultiPeerConfig::default(),
    )
}

struct NoHooks;
impl FleetHooks for NoHooks {}

#[tokio::test]
async fn test_durable_completion_after_fleet_recreation() {
    let storage: Arc<dyn PendingCallStorage> = Arc::new(MemoryCallStorage::new());
    let callbacks = Arc::new(CallbackRegistry::new());
    let clock = Arc::new(ManualClock::at(100_000));

    let seen: Arc<Mutex<Vec<(CallbackPayload, String)>>> = Arc::new(Mutex::new(Vec::new()));
    callbacks.register("onDone", {
        let seen = seen.clone();
        move |payload, context| seen.lock().unwrap().push((payload, context.call.id.clone()))
    });

    // First incarnation: accept a connection and issue a durable call.
    {
        let factory = Arc::new(DurableFactory::new(
            storage.clone(),
            callbacks.clone(),
            clock.clone(),
        ));
        let fleet = durable_fleet(factory.clone());
        fleet.accept("conn-1", MemoryTransport::open());
        factory
            .last_built()
            .call_with_callback("remoteMethod", json!({"id": "123"}), "onDone", None)
            .unwrap();
        // Dropping the fleet closes the peer; the durable row survives.
    }
    assert!(storage.get("durable-1").unwrap().is_some());

    // Second incarnation: same storage and registry, fresh fleet. The
    // completion arrives on a connection id this fleet has never seen.
    clock.advance(3_000);
    let factory = Arc::new(DurableFactory::new(
        storage.clone(),
        callbacks.clone(),
        clock.clone(),
    ));
    let fleet = durable_fleet(factory);
    let transport = MemoryTransport::open();
    fleet
        .handle_message(
            "conn-1",
            InboundFrame::Text(
                r#"{"type":"rpc:response","id":"durable-1","result":{"name":"R"}}"#.into(),
            ),
            transport as Arc<dyn Transport>,
        )
        .await;

    assert_eq!(fleet.connection_count(), 1, "peer lazily recreated");
    assert!(storage.get("durable-1").unwrap().is_none(), "row settled");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, CallbackPayload::Result(json!({"name": "R"})));
    assert_eq!(seen[0].1, "durable-1");
}

#[tokio::test]
async fn test_durable_sink_delegates_requests_to_recreated_peer() {
    let storage: Arc<dyn PendingCallStorage> = Arc::new(MemoryCallStorage::new());
    let callbacks = Arc::new(CallbackRegistry::new());
    let clock = Arc::new(ManualClock::at(0));

    let factory = Arc::new(DurableFactory::new(storage, callbacks, clock));
    let fleet = durable_fleet(factory);

    // A plain response for an id with no durable row must fall through to
    // standard dispatch on the recreated peer (where it is warn-dropped as
    // unknown), not crash the durable interception.
    let transport = MemoryTransport::open();
    fleet
        .handle_message(
            "conn-9",
            InboundFrame::Text(r#"{"type":"rpc:response","id":"55","result":null}"#.into()),
            transport.clone() as Arc<dyn Transport>,
        )
        .await;

    assert_eq!(fleet.connection_count(), 1);
    assert_eq!(transport.sent_count(), 0);
}
