//! Local method implementations a peer exposes to remote callers.

use std::collections::HashMap;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use thiserror::Error;

/// A handler failure, transformed into an `rpc:error` reply for the remote.
///
/// Handler failures never propagate locally.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct HandlerError {
    /// Human-readable description, forwarded to the remote caller.
    pub message: String,
}

impl HandlerError {
    /// Creates a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

type Handler = Box<dyn Fn(Value) -> BoxFuture<'static, Result<Value, HandlerError>> + Send + Sync>;

/// The table of local method handlers.
///
/// A provider maps method names to async handlers. Declaring a method in the
/// local schema without registering a handler is legal; remote calls to it
/// are answered with a "not implemented" error frame.
///
/// # Example
///
/// ```
/// use duorpc_peer::Provider;
/// use serde_json::json;
///
/// let mut provider = Provider::new();
/// provider.register("ping", |_params| async move { Ok(json!("pong")) });
/// assert!(provider.contains("ping"));
/// ```
#[derive(Default)]
pub struct Provider {
    handlers: HashMap<String, Handler>,
}

impl Provider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an async handler for a method name.
    ///
    /// The handler receives the schema-validated params and returns the raw
    /// output, which the peer validates against the method's output schema
    /// before replying. Registering the same name twice replaces the handler.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.handlers
            .insert(name.into(), Box::new(move |params| handler(params).boxed()));
    }

    /// Looks up a handler.
    pub(crate) fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    /// True if a handler is registered for the name.
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
