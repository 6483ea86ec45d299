use std::{collections::HashSet, fmt, sync::Arc};

use chrono::NaiveDate;
use tracing::{debug, warn};

use super::{
    filter::{newest_first, CategoryFilter},
    record::{normalize_amount, AmountInput, Category, RecordId, TransactionRecord},
    totals::{AggregateTracker, Totals},
};
use crate::time::{Clock, SystemClock};

/// Caller-supplied fields for a new record. Unset fields take the entry form's defaults:
/// `Income` and today's date.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDraft {
    pub amount: AmountInput,
    pub source: String,
    pub category: Category,
    pub date: Option<NaiveDate>,
}

impl RecordDraft {
    pub fn new(amount: impl Into<AmountInput>) -> Self {
        Self {
            amount: amount.into(),
            source: String::new(),
            category: Category::default(),
            date: None,
        }
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Outcome of replacing the ledger contents with a persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub loaded: usize,
    /// Ids that collided with an earlier record in the snapshot and were reissued.
    pub reassigned: Vec<(RecordId, RecordId)>,
    /// Records whose stored amount was negative or non-finite.
    pub normalized_amounts: usize,
}

/// In-memory aggregate owning one session's records, running totals and filter selection.
///
/// Records enter only through [`Ledger::add`] and leave only through [`Ledger::delete`]
/// (or wholesale via [`Ledger::load_snapshot`] / [`Ledger::clear`]), so the running
/// totals always equal the sums over the live records.
pub struct Ledger {
    records: Vec<TransactionRecord>,
    tracker: AggregateTracker,
    filter: CategoryFilter,
    next_id: RecordId,
    clock: Arc<dyn Clock>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("records", &self.records)
            .field("tracker", &self.tracker)
            .field("filter", &self.filter)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Vec::new(),
            tracker: AggregateTracker::default(),
            filter: CategoryFilter::default(),
            next_id: 0,
            clock,
        }
    }

    /// Appends a record and credits its amount to the matching totals.
    pub fn add(&mut self, draft: RecordDraft) -> TransactionRecord {
        let record = TransactionRecord {
            id: self.allocate_id(),
            amount: draft.amount.normalize(),
            source: draft.source,
            category: draft.category,
            date: draft.date.unwrap_or_else(|| self.clock.today()),
        };
        self.tracker.credit(record.category, record.amount);
        debug!(
            id = record.id,
            amount = record.amount,
            category = %record.category,
            "record added"
        );
        self.records.push(record.clone());
        record
    }

    /// Removes the record with `id`, reversing the credit it made when it was added.
    /// Unknown ids are ignored.
    pub fn delete(&mut self, id: RecordId) -> Option<TransactionRecord> {
        let position = self.records.iter().position(|record| record.id == id)?;
        let removed = self.records.remove(position);
        self.tracker.reverse(removed.category, removed.amount);
        debug!(id, amount = removed.amount, category = %removed.category, "record deleted");
        Some(removed)
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.filter = filter;
    }

    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }

    /// Records matching the current filter, newest first.
    pub fn current_view(&self) -> Vec<&TransactionRecord> {
        self.view(self.filter)
    }

    pub fn view(&self, filter: CategoryFilter) -> Vec<&TransactionRecord> {
        newest_first(&self.records, filter).collect()
    }

    pub fn totals(&self) -> Totals {
        self.tracker.totals()
    }

    /// Live records in insertion order.
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&TransactionRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next [`Ledger::add`] will assign.
    pub fn next_id(&self) -> RecordId {
        self.next_id
    }

    /// Replaces the whole record set and re-derives the totals from it.
    ///
    /// Persisted ids are kept; ids already seen earlier in the snapshot are reissued so the
    /// store stays unique. The id counter never moves backwards within a session.
    pub fn load_snapshot(&mut self, snapshot: Vec<TransactionRecord>) -> SnapshotReport {
        let mut report = SnapshotReport {
            loaded: snapshot.len(),
            ..SnapshotReport::default()
        };

        let highest = snapshot.iter().map(|record| record.id).max();
        if let Some(highest) = highest {
            self.next_id = self.next_id.max(highest.saturating_add(1));
        }

        let mut seen = HashSet::with_capacity(snapshot.len());
        let mut records = Vec::with_capacity(snapshot.len());
        for mut record in snapshot {
            if !seen.insert(record.id) {
                let fresh = self.allocate_id();
                warn!(original = record.id, fresh, "duplicate record id in snapshot");
                report.reassigned.push((record.id, fresh));
                record.id = fresh;
                seen.insert(fresh);
            }
            let normalized = normalize_amount(record.amount);
            if normalized.to_bits() != record.amount.to_bits() {
                report.normalized_amounts += 1;
                record.amount = normalized;
            }
            records.push(record);
        }

        self.tracker = AggregateTracker::from_records(&records);
        self.records = records;
        report
    }

    /// Drops every record, zeroes the totals and resets the filter and id counter.
    pub fn clear(&mut self) {
        self.records.clear();
        self.tracker.reset();
        self.filter = CategoryFilter::default();
        self.next_id = 0;
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
