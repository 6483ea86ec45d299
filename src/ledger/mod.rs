//! Transaction ledger: record store, running totals and category views.

pub mod filter;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod record;
pub mod totals;

pub use filter::CategoryFilter;
pub use ledger::{Ledger, RecordDraft, SnapshotReport};
pub use record::{AmountInput, Category, RecordId, TransactionRecord};
pub use totals::{AggregateTracker, Totals};
