//! Named continuations for durable calls.
//!
//! A durable call's completion is routed by a **string name** that is
//! persisted alongside the call, not by a closure held in memory. The
//! registry is the explicit form of that contract: hosts register each
//! continuation under the name durable calls will reference, and recreate
//! the same registrations after a hibernation cycle.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::call::PendingCall;

/// What a continuation receives when its call completes.
///
/// Success and failure share a single entrypoint by contract: an `rpc:error`
/// completion invokes the same named callback with the error payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackPayload {
    /// The raw `result` of an `rpc:response` completion.
    Result(Value),
    /// The code and message of an `rpc:error` completion.
    Error {
        /// The remote-reported code.
        code: i32,
        /// The remote-reported message.
        message: String,
    },
}

/// Completion metadata handed to the continuation.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    /// The stored call this completion settled.
    pub call: PendingCall,
    /// Milliseconds between send and completion, by the durable clock.
    pub latency_ms: u64,
}

type Callback = Box<dyn Fn(CallbackPayload, CallbackContext) + Send + Sync>;

/// The name-to-continuation mapping consumed by durable peers.
///
/// # Example
///
/// ```
/// use duorpc_durable::{CallbackPayload, CallbackRegistry};
///
/// let registry = CallbackRegistry::new();
/// registry.register("onDone", |payload, ctx| {
///     if let CallbackPayload::Result(value) = payload {
///         println!("{} finished in {}ms: {value}", ctx.call.method, ctx.latency_ms);
///     }
/// });
/// assert!(registry.contains("onDone"));
/// ```
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: RwLock<HashMap<String, Callback>>,
}

impl CallbackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a continuation under a name. Re-registering replaces.
    pub fn register<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(CallbackPayload, CallbackContext) + Send + Sync + 'static,
    {
        self.callbacks.write().insert(name.into(), Box::new(callback));
    }

    /// Removes a continuation; returns whether it existed.
    pub fn unregister(&self, name: &str) -> bool {
        self.callbacks.write().remove(name).is_some()
    }

    /// True if a continuation is registered under the name.
    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.read().contains_key(name)
    }

    /// Invokes a continuation; returns whether it was registered.
    pub fn invoke(&self, name: &str, payload: CallbackPayload, context: CallbackContext) -> bool {
        let callbacks = self.callbacks.read();
        match callbacks.get(name) {
            Some(callback) => {
                callback(payload, context);
                true
            }
            None => false,
        }
    }
}
