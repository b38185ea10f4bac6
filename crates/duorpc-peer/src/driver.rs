//! The call surface for invoking remote methods.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use duorpc_common::protocol::RpcError;

use crate::peer::Peer;

/// A cloneable handle for invoking remote methods on one peer.
///
/// The driver is a thin facade over [`Peer::call`]: every method the remote
/// schema declares is reachable through [`Driver::invoke`] by name. Hosts
/// wanting a typed surface generate one stub per schema method over this.
///
/// # Example
///
/// ```no_run
/// # use std::sync::Arc;
/// # use duorpc_peer::{Driver, Peer};
/// # use serde_json::json;
/// # async fn run(peer: Arc<Peer>) -> Result<(), Box<dyn std::error::Error>> {
/// let driver = Driver::new(peer);
/// let user = driver.invoke("getUser", json!({"id": "123"})).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Driver {
    peer: Arc<Peer>,
}

impl Driver {
    /// Creates a driver over a peer.
    pub fn new(peer: Arc<Peer>) -> Self {
        Self { peer }
    }

    /// The peer this driver invokes on.
    pub fn peer(&self) -> &Arc<Peer> {
        &self.peer
    }

    /// Invokes a remote method with the peer's default timeout.
    pub async fn invoke(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.peer.call(method, params).await
    }

    /// Invokes a remote method with an explicit timeout.
    pub async fn invoke_with_timeout(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, RpcError> {
        self.peer
            .call_with_timeout(method, params, Some(timeout))
            .await
    }

    /// Emits an event on the underlying peer.
    pub fn emit(&self, event: &str, data: Value) {
        self.peer.emit(event, data);
    }
}
