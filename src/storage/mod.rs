//! Persistence collaborator contract and the bundled backends.

pub mod json_backend;
pub mod memory;
mod watchers;

use std::sync::mpsc::Receiver;

use crate::{errors::Result, ledger::TransactionRecord, session::UserId};

/// Pushed by a backend whenever a user's stored record set changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotUpdate {
    /// The complete record set as it now stands.
    Replaced(Vec<TransactionRecord>),
    /// The backend could not produce the new value.
    Failed(String),
}

/// Key-value store of each user's record set.
///
/// Backends own wire format, retries and conflict resolution; the ledger only asks for
/// whole snapshots and hands back whole record sets.
pub trait PersistenceProvider: Send + Sync {
    /// Current record set for `user`; an unknown user has an empty set.
    fn load_snapshot(&self, user: &UserId) -> Result<Vec<TransactionRecord>>;

    /// Subscribes to later changes of `user`'s record set. Dropping the receiver
    /// unsubscribes.
    fn watch(&self, user: &UserId) -> Result<Receiver<SnapshotUpdate>>;

    /// Replaces the stored record set for `user`.
    fn store_records(&self, user: &UserId, records: &[TransactionRecord]) -> Result<()>;
}

pub use json_backend::{JsonRecordStore, StoredRecords, RECORDS_SCHEMA_VERSION};
pub use memory::MemoryRecordStore;
