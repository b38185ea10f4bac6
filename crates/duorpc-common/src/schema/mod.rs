//! Schema interfaces consumed at every call edge.
//!
//! A [`Schema`] is a pair of mappings: method name to input/output validators,
//! and event name to data validator. The schema definition language itself is
//! external; this module only consumes the opaque
//! `validate(value) -> Ok(normalized) | Err(issues)` contract through the
//! [`Validate`] trait.
//!
//! Each peer holds two schemas: its **local** schema (what it serves and
//! emits) and its **remote** schema (what it may call and expects to receive
//! as events). Validation sites:
//!
//! - outbound call input, against the remote schema (reject before the wire)
//! - inbound request params, against the local schema
//! - handler output, against the local schema (before responding)
//! - event data on both edges (best-effort: warn and drop on failure)
//!
//! Inbound call **results** are deliberately not validated on the caller's
//! side; the caller trusts the remote-declared output schema.

mod validator;

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use validator::{AnyValidator, JsonSchemaValidator, SchemaError};

/// One problem reported by a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// JSON pointer to the offending value, empty for the root.
    pub path: String,
    /// Human-readable description.
    pub message: String,
}

impl Issue {
    /// Creates an issue at the given pointer path.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// The opaque validator contract.
///
/// `validate` returns the (possibly normalized) value on success. Validators
/// must be pure: the same input always yields the same outcome.
pub trait Validate: Send + Sync {
    /// Validates a value, returning its normalized form or the issues found.
    fn validate(&self, value: &Value) -> Result<Value, Vec<Issue>>;
}

/// The validator pair for one method.
pub struct MethodSchema {
    input: Arc<dyn Validate>,
    output: Arc<dyn Validate>,
}

impl MethodSchema {
    /// The input validator.
    pub fn input(&self) -> &dyn Validate {
        self.input.as_ref()
    }

    /// The output validator.
    pub fn output(&self) -> &dyn Validate {
        self.output.as_ref()
    }
}

/// Declares the methods and events one side of a connection understands.
///
/// # Example
///
/// ```
/// use duorpc_common::schema::{AnyValidator, Schema};
///
/// let schema = Schema::builder()
///     .method("getUser", AnyValidator, AnyValidator)
///     .event("userChanged", AnyValidator)
///     .build();
/// assert!(schema.method("getUser").is_some());
/// assert!(schema.event("userChanged").is_some());
/// ```
#[derive(Default)]
pub struct Schema {
    methods: HashMap<String, MethodSchema>,
    events: HashMap<String, Arc<dyn Validate>>,
}

impl Schema {
    /// Starts building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder {
            schema: Schema::default(),
        }
    }

    /// An empty schema: no methods, no events.
    pub fn empty() -> Arc<Self> {
        Arc::new(Schema::default())
    }

    /// Looks up a method's validator pair.
    pub fn method(&self, name: &str) -> Option<&MethodSchema> {
        self.methods.get(name)
    }

    /// Looks up an event's data validator.
    pub fn event(&self, name: &str) -> Option<&dyn Validate> {
        self.events.get(name).map(|v| v.as_ref())
    }

    /// Declared method names, in no particular order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Declared event names, in no particular order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> {
        self.events.keys().map(String::as_str)
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declares a method with its input and output validators.
    pub fn method(
        mut self,
        name: impl Into<String>,
        input: impl Validate + 'static,
        output: impl Validate + 'static,
    ) -> Self {
        self.schema.methods.insert(
            name.into(),
            MethodSchema {
                input: Arc::new(input),
                output: Arc::new(output),
            },
        );
        self
    }

    /// Declares an event with its data validator.
    pub fn event(mut self, name: impl Into<String>, data: impl Validate + 'static) -> Self {
        self.schema.events.insert(name.into(), Arc::new(data));
        self
    }

    /// Finishes the schema behind an `Arc`, ready to share across peers.
    pub fn build(self) -> Arc<Schema> {
        Arc::new(self.schema)
    }
}
