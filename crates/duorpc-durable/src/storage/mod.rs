//! Synchronous storage for durable pending calls.
//!
//! The storage is owned by the host runtime and outlives any single peer.
//! Operations are synchronous and transactional per call: a completed `save`
//! must be observable by a subsequent `get` on the same instance before the
//! request frame is sent.

mod memory;
mod sqlite;

use thiserror::Error;

pub use memory::MemoryCallStorage;
pub use sqlite::SqliteCallStorage;

use crate::call::PendingCall;

/// Storage backend failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The SQLite backend failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored params column did not decode.
    #[error("stored params are not valid JSON: {0}")]
    Params(#[from] serde_json::Error),
}

/// Result alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// The synchronous pending-call storage contract.
///
/// Returned records never alias the stored representation; mutating a
/// returned [`PendingCall`] has no effect on storage.
pub trait PendingCallStorage: Send + Sync {
    /// Inserts or replaces by id. Visible to `get` before returning.
    fn save(&self, call: &PendingCall) -> Result<()>;

    /// Fetches a defensive copy of the record, if present.
    fn get(&self, id: &str) -> Result<Option<PendingCall>>;

    /// Removes a record; returns whether it existed.
    fn delete(&self, id: &str) -> Result<bool>;

    /// All records with `timeout_at <= before_ms`, ascending by `timeout_at`.
    fn list_expired(&self, before_ms: u64) -> Result<Vec<PendingCall>>;

    /// All records, ascending by `sent_at`.
    fn list_all(&self) -> Result<Vec<PendingCall>>;

    /// Removes every record.
    fn clear(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod contract_tests {
    //! The behavioral contract every backend must satisfy, run against each.

    use serde_json::json;

    use super::*;

    fn call(id: &str, sent_at: u64, timeout_at: u64) -> PendingCall {
        PendingCall {
            id: id.into(),
            method: "getUser".into(),
            params: json!({"id": "123"}),
            callback: "onDone".into(),
            sent_at,
            timeout_at,
        }
    }

    pub(crate) fn save_is_visible_to_get(storage: &dyn PendingCallStorage) {
        let original = call("durable-1", 100, 5100);
        storage.save(&original).unwrap();
        assert_eq!(storage.get("durable-1").unwrap(), Some(original));
        assert_eq!(storage.get("durable-2").unwrap(), None);
    }

    pub(crate) fn save_replaces_by_id(storage: &dyn PendingCallStorage) {
        storage.save(&call("durable-1", 100, 5100)).unwrap();
        let replacement = PendingCall {
            callback: "onRetry".into(),
            ..call("durable-1", 200, 5200)
        };
        storage.save(&replacement).unwrap();
        assert_eq!(storage.get("durable-1").unwrap(), Some(replacement));
        assert_eq!(storage.list_all().unwrap().len(), 1);
    }

    pub(crate) fn delete_reports_existence(storage: &dyn PendingCallStorage) {
        storage.save(&call("durable-1", 100, 5100)).unwrap();
        assert!(storage.delete("durable-1").unwrap());
        assert!(!storage.delete("durable-1").unwrap());
        assert_eq!(storage.get("durable-1").unwrap(), None);
    }

    pub(crate) fn list_expired_filters_and_sorts(storage: &dyn PendingCallStorage) {
        storage.save(&call("late", 300, 9000)).unwrap();
        storage.save(&call("first", 100, 1000)).unwrap();
        storage.save(&call("second", 200, 2000)).unwrap();

        let expired = storage.list_expired(2000).unwrap();
        let ids: Vec<&str> = expired.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    pub(crate) fn list_all_sorts_by_sent_at(storage: &dyn PendingCallStorage) {
        storage.save(&call("b", 200, 9000)).unwrap();
        storage.save(&call("a", 100, 8000)).unwrap();
        storage.save(&call("c", 300, 7000)).unwrap();

        let all = storage.list_all().unwrap();
        let ids: Vec<&str> = all.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    pub(crate) fn clear_removes_everything(storage: &dyn PendingCallStorage) {
        storage.save(&call("a", 100, 8000)).unwrap();
        storage.save(&call("b", 200, 9000)).unwrap();
        storage.clear().unwrap();
        assert!(storage.list_all().unwrap().is_empty());
    }

    pub(crate) fn returned_records_do_not_alias(storage: &dyn PendingCallStorage) {
        storage.save(&call("durable-1", 100, 5100)).unwrap();
        let mut copy = storage.get("durable-1").unwrap().unwrap();
        copy.callback = "mutated".into();
        assert_eq!(
            storage.get("durable-1").unwrap().unwrap().callback,
            "onDone"
        );
    }
}
