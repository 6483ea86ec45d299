#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use chrono::NaiveDate;
use finance_ledger::{
    ledger::{Category, TransactionRecord},
    session::{LedgerSession, LocalIdentity, SessionContext},
    storage::PersistenceProvider,
    time::FixedClock,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).expect("valid date")
}

pub fn record(id: u64, amount: f64, source: &str, category: Category) -> TransactionRecord {
    TransactionRecord {
        id,
        amount,
        source: source.to_string(),
        category,
        date: today(),
    }
}

/// Session wired to `store` with a fixed clock, plus the identity that drives it.
pub fn session_over(
    store: Arc<dyn PersistenceProvider>,
) -> (Arc<LocalIdentity>, LedgerSession) {
    let identity = Arc::new(LocalIdentity::new());
    let context = SessionContext::new(identity.clone(), store)
        .with_clock(Arc::new(FixedClock(today())));
    let session = LedgerSession::new(context).expect("session subscribes");
    (identity, session)
}
