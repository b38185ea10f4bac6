//! Map-backed reference storage.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::{PendingCallStorage, Result};
use crate::call::PendingCall;

/// In-memory pending-call storage.
///
/// Suitable for tests and for hosts whose "durable" scope is a long-lived
/// supervisor process rather than disk. Shares the exact contract of the
/// SQLite backend.
#[derive(Default)]
pub struct MemoryCallStorage {
    calls: Mutex<HashMap<String, PendingCall>>,
}

impl MemoryCallStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PendingCallStorage for MemoryCallStorage {
    fn save(&self, call: &PendingCall) -> Result<()> {
        self.calls.lock().insert(call.id.clone(), call.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PendingCall>> {
        Ok(self.calls.lock().get(id).cloned())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.calls.lock().remove(id).is_some())
    }

    fn list_expired(&self, before_ms: u64) -> Result<Vec<PendingCall>> {
        let mut expired: Vec<PendingCall> = self
            .calls
            .lock()
            .values()
            .filter(|call| call.timeout_at <= before_ms)
            .cloned()
            .collect();
        expired.sort_by_key(|call| call.timeout_at);
        Ok(expired)
    }

    fn list_all(&self) -> Result<Vec<PendingCall>> {
        let mut all: Vec<PendingCall> = self.calls.lock().values().cloned().collect();
        all.sort_by_key(|call| call.sent_at);
        Ok(all)
    }

    fn clear(&self) -> Result<()> {
        self.calls.lock().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::contract_tests;
    use super::*;

    #[test]
    fn test_save_is_visible_to_get() {
        contract_tests::save_is_visible_to_get(&MemoryCallStorage::new());
    }

    #[test]
    fn test_save_replaces_by_id() {
        contract_tests::save_replaces_by_id(&MemoryCallStorage::new());
    }

    #[test]
    fn test_delete_reports_existence() {
        contract_tests::delete_reports_existence(&MemoryCallStorage::new());
    }

    #[test]
    fn test_list_expired_filters_and_sorts() {
        contract_tests::list_expired_filters_and_sorts(&MemoryCallStorage::new());
    }

    #[test]
    fn test_list_all_sorts_by_sent_at() {
        contract_tests::list_all_sorts_by_sent_at(&MemoryCallStorage::new());
    }

    #[test]
    fn test_clear_removes_everything() {
        contract_tests::clear_removes_everything(&MemoryCallStorage::new());
    }

    #[test]
    fn test_returned_records_do_not_alias() {
        contract_tests::returned_records_do_not_alias(&MemoryCallStorage::new());
    }
}
