//! The durable peer: persisted calls layered over a plain peer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use duorpc_common::protocol::{Message, RpcError};
use duorpc_common::transport::InboundFrame;
use duorpc_peer::{MessageSink, Peer};

use crate::call::PendingCall;
use crate::clock::{Clock, SystemClock};
use crate::registry::{CallbackContext, CallbackPayload, CallbackRegistry};
use crate::storage::{PendingCallStorage, StorageError};

/// Failures specific to durable calls.
#[derive(Debug, Error)]
pub enum DurableError {
    /// The named continuation is not in the registry. Raised synchronously
    /// before anything is persisted or sent.
    #[error("no callback named '{0}' is registered")]
    UnknownCallback(String),

    /// The storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The wire layer failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// A peer whose outgoing calls can survive process suspension.
///
/// `DurablePeer` composes a plain [`Peer`] with external synchronous storage
/// and a [`CallbackRegistry`]. Promise-style calls still go through the inner
/// peer untouched; durable calls persist their pending state first and route
/// their completion to a named continuation, so a new `DurablePeer` built
/// over the same storage and registry finishes what an earlier process
/// incarnation started.
///
/// Inbound frames must flow through [`DurablePeer::handle_message`] (not the
/// inner peer's) so durable completions are intercepted before standard
/// dispatch.
pub struct DurablePeer {
    peer: Arc<Peer>,
    storage: Arc<dyn PendingCallStorage>,
    callbacks: Arc<CallbackRegistry>,
    clock: Arc<dyn Clock>,
    durable_seq: AtomicU64,
    durable_timeout: Option<Duration>,
}

impl DurablePeer {
    /// Creates a durable peer over the system clock.
    pub fn new(
        peer: Arc<Peer>,
        storage: Arc<dyn PendingCallStorage>,
        callbacks: Arc<CallbackRegistry>,
    ) -> Self {
        Self::with_clock(peer, storage, callbacks, Arc::new(SystemClock))
    }

    /// Creates a durable peer with an explicit clock.
    pub fn with_clock(
        peer: Arc<Peer>,
        storage: Arc<dyn PendingCallStorage>,
        callbacks: Arc<CallbackRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            peer,
            storage,
            callbacks,
            clock,
            durable_seq: AtomicU64::new(0),
            durable_timeout: None,
        }
    }

    /// Overrides the default deadline for durable calls.
    ///
    /// Without this, durable calls inherit the inner peer's default timeout.
    pub fn with_durable_timeout(mut self, timeout: Duration) -> Self {
        self.durable_timeout = Some(timeout);
        self
    }

    /// The inner peer. Promise-style calls and emits go through here.
    pub fn peer(&self) -> &Arc<Peer> {
        &self.peer
    }

    /// The registry completions are routed through.
    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    /// Issues a durable call whose completion is routed to the continuation
    /// registered under `callback`.
    ///
    /// The pending record is persisted **before** the request frame is sent;
    /// see the [crate docs](crate) for why that ordering is load-bearing. If
    /// the transport is not open the call stays persisted and nothing is
    /// sent — the host may retry after reconnect. Returns the durable call id.
    pub fn call_with_callback(
        &self,
        method: &str,
        params: Value,
        callback: &str,
        timeout: Option<Duration>,
    ) -> Result<String, DurableError> {
        if !self.callbacks.contains(callback) {
            return Err(DurableError::UnknownCallback(callback.to_string()));
        }

        let now = self.clock.now_ms();
        let timeout = timeout
            .or(self.durable_timeout)
            .unwrap_or_else(|| self.peer.default_timeout());
        let id = self.next_durable_id()?;
        let call = PendingCall {
            id: id.clone(),
            method: method.to_string(),
            params: params.clone(),
            callback: callback.to_string(),
            sent_at: now,
            timeout_at: now + timeout.as_millis() as u64,
        };

        // Persist before send: a suspension between the two is recoverable,
        // the reverse ordering loses the continuation.
        self.storage.save(&call)?;

        if self.peer.is_open() {
            let frame = self.peer.protocol().request(&id, method, &params);
            let sent = frame
                .map_err(RpcError::from)
                .and_then(|frame| self.peer.transport().send(frame).map_err(RpcError::from));
            if let Err(err) = sent {
                warn!(
                    peer = %self.peer.id(),
                    call = %id,
                    error = %err,
                    "durable request not sent; call stays persisted for retry"
                );
            }
        } else {
            warn!(
                peer = %self.peer.id(),
                call = %id,
                "transport not open; durable call persisted for retry after reconnect"
            );
        }

        Ok(id)
    }

    /// Feeds one inbound frame, intercepting durable completions.
    ///
    /// A `Response` or `Error` whose id matches a stored call settles that
    /// call: the row is deleted and the named continuation is invoked with
    /// the payload and completion context. Everything else is delegated to
    /// the inner peer's standard dispatch.
    pub async fn handle_message(&self, frame: InboundFrame) {
        let Some(message) = self.peer.protocol().safe_decode_message(frame) else {
            return;
        };

        if let Message::Response { id, .. } | Message::Error { id, .. } = &message {
            match self.storage.get(id) {
                Ok(Some(call)) => {
                    self.complete_durable(call, message);
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(
                        peer = %self.peer.id(),
                        request = %id,
                        error = %err,
                        "durable storage lookup failed; falling through to standard dispatch"
                    );
                }
            }
        }

        self.peer.dispatch(message).await;
    }

    /// All persisted calls, ascending by send time.
    pub fn pending_calls(&self) -> Result<Vec<PendingCall>, StorageError> {
        self.storage.list_all()
    }

    /// Persisted calls whose deadline has passed, ascending by deadline.
    pub fn expired_calls(&self) -> Result<Vec<PendingCall>, StorageError> {
        self.storage.list_expired(self.clock.now_ms())
    }

    /// Removes and returns expired calls.
    ///
    /// Whether to synthesize timeout callbacks for the returned records is
    /// the caller's decision.
    pub fn cleanup_expired(&self) -> Result<Vec<PendingCall>, StorageError> {
        let expired = self.expired_calls()?;
        for call in &expired {
            self.storage.delete(&call.id)?;
        }
        Ok(expired)
    }

    /// Removes every persisted call.
    pub fn clear_pending_calls(&self) -> Result<(), StorageError> {
        self.storage.clear()
    }

    /// Closes the in-memory peer.
    ///
    /// Durable storage is deliberately untouched: persisted calls remain for
    /// a subsequent peer over the same storage to complete.
    pub fn close(&self) {
        self.peer.close();
    }

    /// Next unused durable id.
    ///
    /// The counter restarts with the process, so ids already occupied by rows
    /// a previous incarnation left pending are skipped rather than upserted
    /// over.
    fn next_durable_id(&self) -> Result<String, StorageError> {
        loop {
            let n = self.durable_seq.fetch_add(1, Ordering::Relaxed) + 1;
            let id = format!("durable-{n}");
            if self.storage.get(&id)?.is_none() {
                return Ok(id);
            }
        }
    }

    fn complete_durable(&self, call: PendingCall, message: Message) {
        if let Err(err) = self.storage.delete(&call.id) {
            warn!(
                peer = %self.peer.id(),
                call = %call.id,
                error = %err,
                "failed to delete completed durable call"
            );
        }

        let payload = match message {
            Message::Response { result, .. } => CallbackPayload::Result(result),
            Message::Error { code, message, .. } => CallbackPayload::Error { code, message },
            // Only completion frames reach here.
            _ => return,
        };

        let latency_ms = self.clock.now_ms().saturating_sub(call.sent_at);
        debug!(
            peer = %self.peer.id(),
            call = %call.id,
            callback = %call.callback,
            latency_ms,
            "routing durable completion"
        );

        let name = call.callback.clone();
        let context = CallbackContext { call, latency_ms };
        if !self.callbacks.invoke(&name, payload, context) {
            warn!(
                peer = %self.peer.id(),
                callback = %name,
                "durable completion arrived but its callback is no longer registered"
            );
        }
    }
}

impl MessageSink for DurablePeer {
    fn handle_message(&self, frame: InboundFrame) -> BoxFuture<'_, ()> {
        DurablePeer::handle_message(self, frame).boxed()
    }
}
