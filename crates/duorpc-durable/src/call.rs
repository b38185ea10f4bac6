//! The persisted pending-call record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One durable outgoing call, owned by external storage.
///
/// Lives from [`call_with_callback`](crate::DurablePeer::call_with_callback)
/// until a completion frame arrives, the row expires and is cleaned up, or it
/// is cleared explicitly. Unlike the in-memory pending map, these records
/// survive process suspension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCall {
    /// Correlation id, from the durable counter (`durable-N`), disjoint from
    /// the peer's promise-style ids.
    pub id: String,
    /// The remote method that was invoked.
    pub method: String,
    /// The request params as sent.
    pub params: Value,
    /// Name of the registered continuation to invoke on completion.
    pub callback: String,
    /// Wall-clock send time, milliseconds since the epoch.
    pub sent_at: u64,
    /// Wall-clock expiry, milliseconds since the epoch.
    pub timeout_at: u64,
}
