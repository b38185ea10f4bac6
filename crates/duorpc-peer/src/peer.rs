//! The peer state machine: correlation, timeouts, dispatch, close.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use duorpc_common::protocol::{codes, Message, RpcError};
use duorpc_common::schema::{Issue, Schema};
use duorpc_common::transport::{InboundFrame, ReadyState, Transport, WireFrame};
use duorpc_common::wire::Protocol;

use crate::provider::Provider;

/// Counter behind default peer ids.
static PEER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Peer construction options.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Identifier for logs and supervision; auto-generated when empty.
    pub id: Option<String>,
    /// Deadline applied to calls that do not specify their own, in
    /// milliseconds.
    pub default_timeout_ms: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            id: None,
            default_timeout_ms: 30_000,
        }
    }
}

type EventHandler = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// An outbound call awaiting its correlated reply.
struct PendingRequest {
    method: String,
    tx: oneshot::Sender<Result<Value, RpcError>>,
}

/// Mutable peer state. Lock sections are short and never cross an await.
struct PeerState {
    pending: HashMap<String, PendingRequest>,
    closed: bool,
}

/// One endpoint of a symmetric duorpc connection.
///
/// See the [crate docs](crate) for the call flow and concurrency model. A
/// peer does not own its transport; it observes readiness and calls
/// `send`/`close` on the handle it was given.
pub struct Peer {
    id: String,
    transport: Arc<dyn Transport>,
    protocol: Protocol,
    local_schema: Arc<Schema>,
    remote_schema: Arc<Schema>,
    provider: Arc<Provider>,
    event_handler: Mutex<Option<EventHandler>>,
    default_timeout: Duration,
    next_request_id: AtomicU64,
    state: Mutex<PeerState>,
}

impl Peer {
    /// Creates a peer with default options.
    pub fn new(
        transport: Arc<dyn Transport>,
        protocol: Protocol,
        local_schema: Arc<Schema>,
        remote_schema: Arc<Schema>,
        provider: Arc<Provider>,
    ) -> Self {
        Self::with_config(
            transport,
            protocol,
            local_schema,
            remote_schema,
            provider,
            PeerConfig::default(),
        )
    }

    /// Creates a peer with explicit options.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        protocol: Protocol,
        local_schema: Arc<Schema>,
        remote_schema: Arc<Schema>,
        provider: Arc<Provider>,
        config: PeerConfig,
    ) -> Self {
        let id = config
            .id
            .unwrap_or_else(|| format!("peer-{}", PEER_SEQ.fetch_add(1, Ordering::Relaxed) + 1));
        Self {
            id,
            transport,
            protocol,
            local_schema,
            remote_schema,
            provider,
            event_handler: Mutex::new(None),
            default_timeout: Duration::from_millis(config.default_timeout_ms),
            next_request_id: AtomicU64::new(0),
            state: Mutex::new(PeerState {
                pending: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// This peer's identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The transport handle this peer sends on.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// The wire protocol for this connection.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// The deadline applied to calls without an explicit timeout.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// True while the peer is not closed and the transport is open.
    pub fn is_open(&self) -> bool {
        !self.state.lock().closed && self.transport.ready_state() == ReadyState::Open
    }

    /// Number of outbound calls currently awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Installs the inbound event handler.
    ///
    /// Without a handler, inbound events are dropped without schema lookup.
    pub fn set_event_handler<F>(&self, handler: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        *self.event_handler.lock() = Some(Arc::new(handler));
    }

    /// Invokes a remote method with the default timeout.
    ///
    /// The input is validated against the remote schema before anything
    /// reaches the wire. The delivered `result` is the raw decoded value: the
    /// caller trusts the remote-declared output schema and no caller-side
    /// output validation is performed.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.call_with_timeout(method, params, None).await
    }

    /// Invokes a remote method, overriding the default timeout.
    pub async fn call_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<Value, RpcError> {
        if !self.is_open() {
            return Err(RpcError::ConnectionClosed);
        }
        let signature = self
            .remote_schema
            .method(method)
            .ok_or_else(|| RpcError::MethodNotFound {
                method: method.to_string(),
            })?;
        let params = signature
            .input()
            .validate(&params)
            .map_err(|issues| RpcError::Validation {
                context: method.to_string(),
                issues,
            })?;

        let timeout = timeout.unwrap_or(self.default_timeout);
        let id = (self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
        let (tx, mut rx) = oneshot::channel();

        {
            let mut state = self.state.lock();
            if state.closed {
                return Err(RpcError::ConnectionClosed);
            }
            state.pending.insert(
                id.clone(),
                PendingRequest {
                    method: method.to_string(),
                    tx,
                },
            );
        }

        // Registration and send are sequential with no suspension point in
        // between, so a reply can never race past its own pending entry.
        let sent = self
            .protocol
            .request(&id, method, &params)
            .map_err(RpcError::from)
            .and_then(|frame| self.transport.send(frame).map_err(RpcError::from));
        if let Err(err) = sent {
            self.state.lock().pending.remove(&id);
            return Err(err);
        }

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        tokio::select! {
            outcome = &mut rx => match outcome {
                Ok(result) => result,
                // The sender was dropped without settling; only close() does
                // that, and close() settles first, so treat it as closed.
                Err(_) => Err(RpcError::ConnectionClosed),
            },
            _ = &mut deadline => {
                let expired = self.state.lock().pending.remove(&id).is_some();
                if expired {
                    Err(RpcError::Timeout {
                        method: method.to_string(),
                        timeout_ms: timeout.as_millis() as u64,
                    })
                } else {
                    // A reply won the race with the deadline; take it.
                    match rx.await {
                        Ok(result) => result,
                        Err(_) => Err(RpcError::ConnectionClosed),
                    }
                }
            }
        }
    }

    /// Emits an event to the remote side.
    ///
    /// Events are fire-and-forget: no id, no acknowledgement, no deadline.
    /// Unknown event names, invalid data, and closed transports all drop the
    /// event with a warning; `emit` never fails.
    pub fn emit(&self, event: &str, data: Value) {
        if !self.is_open() {
            warn!(peer = %self.id, event, "dropping event emit on closed connection");
            return;
        }
        let Some(validator) = self.local_schema.event(event) else {
            warn!(peer = %self.id, event, "dropping emit of unknown event");
            return;
        };
        let data = match validator.validate(&data) {
            Ok(data) => data,
            Err(issues) => {
                warn!(
                    peer = %self.id,
                    event,
                    issues = issues.len(),
                    "dropping emit of event with invalid data"
                );
                return;
            }
        };
        if let Err(err) = self.forward_event(event, &data) {
            warn!(peer = %self.id, event, error = %err, "failed to send event");
        }
    }

    /// Sends an event whose data has already been validated.
    ///
    /// This is the supervision path: a multi-peer broadcast validates the
    /// payload once and forwards it to every target. `emit` is the validating
    /// wrapper around this.
    pub fn forward_event(&self, event: &str, data: &Value) -> Result<(), RpcError> {
        let frame = self.protocol.event(event, data)?;
        self.transport.send(frame)?;
        Ok(())
    }

    /// Feeds one inbound frame through decode and dispatch.
    ///
    /// Malformed frames are dropped silently (logged at debug level); they
    /// never close the transport.
    pub async fn handle_message(&self, frame: InboundFrame) {
        let Some(message) = self.protocol.safe_decode_message(frame) else {
            return;
        };
        self.dispatch(message).await;
    }

    /// Dispatches an already-decoded message.
    ///
    /// Exposed for composition layers that decode first to inspect the
    /// message (durable completion routing) and then delegate here.
    pub async fn dispatch(&self, message: Message) {
        match message {
            Message::Request { id, method, params } => {
                self.handle_request(id, method, params).await;
            }
            Message::Response { id, result } => {
                match self.remove_pending(&id) {
                    Some(pending) => {
                        let _ = pending.tx.send(Ok(result));
                    }
                    None => {
                        warn!(peer = %self.id, request = %id, "dropping response for unknown or settled request");
                    }
                }
            }
            Message::Error {
                id,
                code,
                message,
                data,
            } => match self.remove_pending(&id) {
                Some(pending) => {
                    let _ = pending.tx.send(Err(RpcError::Remote {
                        method: pending.method,
                        code,
                        message,
                        data,
                    }));
                }
                None => {
                    warn!(peer = %self.id, request = %id, code, "dropping error for unknown or settled request");
                }
            },
            Message::Event { event, data } => self.handle_event(&event, data),
        }
    }

    /// Closes the peer: every pending call is rejected with
    /// `ConnectionClosed` and the pending map is cleared. Idempotent.
    ///
    /// The transport is asked to close as well; durable pending-call storage
    /// (when layered on top) is deliberately untouched by this.
    pub fn close(&self) {
        let drained: Vec<PendingRequest> = {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.pending.drain().map(|(_, pending)| pending).collect()
        };
        debug!(peer = %self.id, pending = drained.len(), "closing peer");
        for pending in drained {
            let _ = pending.tx.send(Err(RpcError::ConnectionClosed));
        }
        self.transport.close(None, None);
    }

    fn remove_pending(&self, id: &str) -> Option<PendingRequest> {
        self.state.lock().pending.remove(id)
    }

    async fn handle_request(&self, id: String, method: String, params: Value) {
        let Some(signature) = self.local_schema.method(&method) else {
            self.send_error(
                &id,
                codes::METHOD_NOT_FOUND,
                &format!("Method '{method}' not found"),
                None,
            );
            return;
        };

        let params = match signature.input().validate(&params) {
            Ok(params) => params,
            Err(issues) => {
                self.send_error(
                    &id,
                    codes::INVALID_PARAMS,
                    &format!("Invalid params for '{method}'"),
                    issues_data(&issues),
                );
                return;
            }
        };

        let Some(handler) = self.provider.get(&method) else {
            self.send_error(
                &id,
                codes::METHOD_NOT_FOUND,
                &format!("Method '{method}' is not implemented"),
                None,
            );
            return;
        };

        let output = match handler(params).await {
            Ok(output) => output,
            Err(err) => {
                let message = if err.message.is_empty() {
                    "Unknown error".to_string()
                } else {
                    err.message
                };
                self.send_error(&id, codes::INTERNAL_ERROR, &message, None);
                return;
            }
        };

        let output = match signature.output().validate(&output) {
            Ok(output) => output,
            Err(issues) => {
                self.send_error(
                    &id,
                    codes::INTERNAL_ERROR,
                    &format!("Invalid output from '{method}'"),
                    issues_data(&issues),
                );
                return;
            }
        };

        match self.protocol.response(&id, &output) {
            Ok(frame) => self.send_frame(frame),
            Err(err) => {
                warn!(peer = %self.id, request = %id, error = %err, "failed to encode response");
                self.send_error(
                    &id,
                    codes::INTERNAL_ERROR,
                    &format!("Invalid output from '{method}'"),
                    None,
                );
            }
        }
    }

    fn handle_event(&self, event: &str, data: Value) {
        let handler = self.event_handler.lock().clone();
        let Some(handler) = handler else {
            return;
        };
        let Some(validator) = self.remote_schema.event(event) else {
            warn!(peer = %self.id, event, "dropping inbound event absent from remote schema");
            return;
        };
        match validator.validate(&data) {
            Ok(data) => handler(event, &data),
            Err(issues) => {
                warn!(
                    peer = %self.id,
                    event,
                    issues = issues.len(),
                    "dropping inbound event with invalid data"
                );
            }
        }
    }

    fn send_error(&self, id: &str, code: i32, message: &str, data: Option<Value>) {
        match self.protocol.error(id, code, message, data) {
            Ok(frame) => self.send_frame(frame),
            Err(err) => {
                warn!(peer = %self.id, request = %id, error = %err, "failed to encode error frame");
            }
        }
    }

    fn send_frame(&self, frame: WireFrame) {
        if let Err(err) = self.transport.send(frame) {
            warn!(peer = %self.id, error = %err, "failed to send frame");
        }
    }
}

impl std::fmt::Debug for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("pending", &self.pending_count())
            .field("open", &self.is_open())
            .finish()
    }
}

fn issues_data(issues: &[Issue]) -> Option<Value> {
    serde_json::to_value(issues).ok()
}
