use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::Receiver,
        Mutex, MutexGuard,
    },
};

use super::{watchers::WatcherRegistry, PersistenceProvider, SnapshotUpdate};
use crate::{
    errors::{LedgerError, Result},
    ledger::TransactionRecord,
    session::UserId,
};

/// In-process backend. Besides the provider contract it can play the remote side:
/// push changes made "elsewhere" and fail loads or writes on demand.
#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<UserId, Vec<TransactionRecord>>>,
    watchers: WatcherRegistry,
    fail_loads: AtomicBool,
    fail_writes: AtomicBool,
    fail_watches: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds `user`'s record set without notifying anyone.
    pub fn with_records(self, user: impl Into<UserId>, records: Vec<TransactionRecord>) -> Self {
        if let Ok(mut map) = self.records.lock() {
            map.insert(user.into(), records);
        }
        self
    }

    /// Simulates a change made by another device: stores `records` and pushes them.
    pub fn push_remote(&self, user: &UserId, records: Vec<TransactionRecord>) -> Result<()> {
        self.lock()?.insert(user.clone(), records.clone());
        self.watchers
            .notify(user, SnapshotUpdate::Replaced(records))?;
        Ok(())
    }

    /// Pushes a failure to `user`'s watchers, as a backend would on a broken read.
    pub fn push_failure(&self, user: &UserId, reason: impl Into<String>) -> Result<()> {
        self.watchers
            .notify(user, SnapshotUpdate::Failed(reason.into()))?;
        Ok(())
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_watches(&self, fail: bool) {
        self.fail_watches.store(fail, Ordering::SeqCst);
    }

    /// What is currently stored for `user`.
    pub fn stored(&self, user: &UserId) -> Vec<TransactionRecord> {
        self.lock()
            .ok()
            .and_then(|map| map.get(user).cloned())
            .unwrap_or_default()
    }

    /// Number of successful `store_records` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<UserId, Vec<TransactionRecord>>>> {
        self.records
            .lock()
            .map_err(|_| LedgerError::Persistence("memory store lock poisoned".into()))
    }
}

impl PersistenceProvider for MemoryRecordStore {
    fn load_snapshot(&self, user: &UserId) -> Result<Vec<TransactionRecord>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence(format!(
                "snapshot for `{user}` is unavailable"
            )));
        }
        Ok(self.lock()?.get(user).cloned().unwrap_or_default())
    }

    fn watch(&self, user: &UserId) -> Result<Receiver<SnapshotUpdate>> {
        if self.fail_watches.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence(format!(
                "change feed for `{user}` is unavailable"
            )));
        }
        self.watchers.subscribe(user)
    }

    fn store_records(&self, user: &UserId, records: &[TransactionRecord]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::Persistence(format!(
                "write for `{user}` rejected"
            )));
        }
        self.lock()?.insert(user.clone(), records.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.watchers
            .notify(user, SnapshotUpdate::Replaced(records.to_vec()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Category;
    use chrono::NaiveDate;

    fn record(id: u64) -> TransactionRecord {
        TransactionRecord {
            id,
            amount: 1.0,
            source: String::new(),
            category: Category::Income,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[test]
    fn unknown_user_has_empty_snapshot() {
        let store = MemoryRecordStore::new();
        assert!(store.load_snapshot(&UserId::from("nobody")).unwrap().is_empty());
    }

    #[test]
    fn store_records_notifies_watchers() {
        let store = MemoryRecordStore::new();
        let user = UserId::from("alice");
        let updates = store.watch(&user).unwrap();

        store.store_records(&user, &[record(0)]).unwrap();

        assert_eq!(
            updates.try_recv().unwrap(),
            SnapshotUpdate::Replaced(vec![record(0)])
        );
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.stored(&user), vec![record(0)]);
    }

    #[test]
    fn failure_switches_are_honoured() {
        let store = MemoryRecordStore::new().with_records("alice", vec![record(0)]);
        let user = UserId::from("alice");
        store.fail_loads(true);
        store.fail_writes(true);
        store.fail_watches(true);
        assert!(store.load_snapshot(&user).is_err());
        assert!(store.watch(&user).is_err());
        assert!(store.store_records(&user, &[]).is_err());
        assert_eq!(store.stored(&user), vec![record(0)]);
    }
}
