use std::sync::mpsc::{Receiver, TryRecvError};

use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{SessionContext, SessionEvent, UserId};
use crate::{
    errors::Result,
    ledger::{
        CategoryFilter, Ledger, RecordDraft, RecordId, SnapshotReport, Totals, TransactionRecord,
    },
    storage::SnapshotUpdate,
};

/// Something the host should know about that happened outside a direct call's result.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Started { user: UserId },
    Ended { user: UserId },
    SnapshotApplied { user: UserId, report: SnapshotReport },
    /// The ledger kept its last good state.
    SnapshotFailed { user: UserId, reason: String },
    /// The in-memory mutation stands; the backend did not take the write.
    WriteFailed { user: UserId, reason: String },
}

struct ActiveSession {
    user: UserId,
    id: Uuid,
    updates: Option<Receiver<SnapshotUpdate>>,
    initialized: bool,
}

/// Owner of the signed-in user's [`Ledger`].
///
/// Subscribes to identity events once at construction. [`LedgerSession::process_events`]
/// applies pending session transitions and snapshot pushes; mutations go through
/// [`LedgerSession::add`] / [`LedgerSession::delete`] and are written through to the
/// persistence provider.
pub struct LedgerSession {
    context: SessionContext,
    identity_events: Option<Receiver<SessionEvent>>,
    active: Option<ActiveSession>,
    ledger: Ledger,
    pending: Vec<SessionNotice>,
}

impl LedgerSession {
    pub fn new(context: SessionContext) -> Result<Self> {
        let identity_events = context.identity().subscribe()?;
        let ledger = Ledger::with_clock(context.clock().clone());
        Ok(Self {
            context,
            identity_events: Some(identity_events),
            active: None,
            ledger,
            pending: Vec::new(),
        })
    }

    /// Applies every queued identity transition and snapshot push, returning what happened
    /// (including write failures recorded since the previous call).
    pub fn process_events(&mut self) -> Vec<SessionNotice> {
        let mut notices = std::mem::take(&mut self.pending);

        while let Some(event) = self.next_identity_event() {
            match event {
                SessionEvent::SessionStarted(user) => self.start(user, &mut notices),
                SessionEvent::SessionEnded => self.end(&mut notices),
            }
        }
        self.drain_snapshot_updates(&mut notices);
        notices
    }

    /// Re-reads the active user's snapshot on demand, first reopening the update feed if
    /// it failed to open or has closed since.
    pub fn reload(&mut self) -> Option<SessionNotice> {
        let user = self.active.as_ref()?.user.clone();
        if self.active.as_ref().is_some_and(|active| active.updates.is_none()) {
            let updates = self.subscribe_updates(&user);
            if let Some(active) = self.active.as_mut() {
                active.updates = updates;
            }
        }
        let notice = self.load_initial(&user);
        Some(notice)
    }

    pub fn user(&self) -> Option<&UserId> {
        self.active.as_ref().map(|active| &active.user)
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.active.as_ref().map(|active| active.id)
    }

    /// True once a snapshot has been applied for the active user. Before that the ledger
    /// is empty with zero totals.
    pub fn is_initialized(&self) -> bool {
        self.active.as_ref().is_some_and(|active| active.initialized)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Adds a record and writes the updated record set through to persistence. With no
    /// active session the record lives in memory only.
    pub fn add(&mut self, draft: RecordDraft) -> TransactionRecord {
        let record = self.ledger.add(draft);
        self.write_through();
        record
    }

    /// Deletes a record if present and writes the updated record set through.
    pub fn delete(&mut self, id: RecordId) -> Option<TransactionRecord> {
        let removed = self.ledger.delete(id)?;
        self.write_through();
        Some(removed)
    }

    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.ledger.set_filter(filter);
    }

    pub fn current_view(&self) -> Vec<&TransactionRecord> {
        self.ledger.current_view()
    }

    pub fn totals(&self) -> Totals {
        self.ledger.totals()
    }

    fn next_identity_event(&mut self) -> Option<SessionEvent> {
        let received = self.identity_events.as_ref()?.try_recv();
        match received {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("identity provider hung up; no further session events");
                self.identity_events = None;
                None
            }
        }
    }

    fn start(&mut self, user: UserId, notices: &mut Vec<SessionNotice>) {
        if self.user() == Some(&user) {
            return;
        }
        self.end(notices);

        let id = Uuid::new_v4();
        info!(session = %id, user = %user, "session started");
        notices.push(SessionNotice::Started { user: user.clone() });

        // Subscribe before the initial read so no change slips between the two.
        let updates = self.subscribe_updates(&user);
        notices.append(&mut self.pending);
        self.active = Some(ActiveSession {
            user: user.clone(),
            id,
            updates,
            initialized: false,
        });
        notices.push(self.load_initial(&user));
    }

    /// Opens `user`'s snapshot feed. A failure is queued as a notice and leaves the
    /// session without pushes until the next [`LedgerSession::reload`].
    fn subscribe_updates(&mut self, user: &UserId) -> Option<Receiver<SnapshotUpdate>> {
        match self.context.persistence().watch(user) {
            Ok(receiver) => Some(receiver),
            Err(err) => {
                warn!(user = %user, error = %err, "snapshot subscription failed");
                self.pending.push(SessionNotice::SnapshotFailed {
                    user: user.clone(),
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    fn end(&mut self, notices: &mut Vec<SessionNotice>) {
        // Dropping the receiver is the unsubscribe.
        let Some(active) = self.active.take() else {
            return;
        };
        self.ledger.clear();
        info!(session = %active.id, user = %active.user, "session ended");
        notices.push(SessionNotice::Ended { user: active.user });
    }

    fn load_initial(&mut self, user: &UserId) -> SessionNotice {
        match self.context.persistence().load_snapshot(user) {
            Ok(records) => self.apply_snapshot(user, records),
            Err(err) => {
                warn!(user = %user, error = %err, "snapshot load failed; keeping last good state");
                SessionNotice::SnapshotFailed {
                    user: user.clone(),
                    reason: err.to_string(),
                }
            }
        }
    }

    fn drain_snapshot_updates(&mut self, notices: &mut Vec<SessionNotice>) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let Some(receiver) = active.updates.as_ref() else {
            return;
        };

        // Pushes carry full state, so only the newest replacement in a batch matters.
        let mut latest = None;
        let mut closed = false;
        loop {
            match receiver.try_recv() {
                Ok(SnapshotUpdate::Replaced(records)) => latest = Some(records),
                Ok(SnapshotUpdate::Failed(reason)) => {
                    warn!(session = %active.id, user = %active.user, %reason, "snapshot push failed");
                    notices.push(SessionNotice::SnapshotFailed {
                        user: active.user.clone(),
                        reason,
                    });
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    closed = true;
                    break;
                }
            }
        }
        if closed {
            warn!(session = %active.id, user = %active.user, "snapshot feed closed");
            active.updates = None;
        }

        let Some(records) = latest else {
            return;
        };
        if active.initialized && records.as_slice() == self.ledger.records() {
            debug!(session = %active.id, "snapshot push matches local state");
            return;
        }
        let user = active.user.clone();
        notices.push(self.apply_snapshot(&user, records));
    }

    fn apply_snapshot(&mut self, user: &UserId, records: Vec<TransactionRecord>) -> SessionNotice {
        let report = self.ledger.load_snapshot(records);
        if let Some(active) = self.active.as_mut() {
            active.initialized = true;
            info!(
                session = %active.id,
                user = %user,
                loaded = report.loaded,
                reassigned = report.reassigned.len(),
                normalized = report.normalized_amounts,
                "snapshot applied"
            );
        }
        SessionNotice::SnapshotApplied {
            user: user.clone(),
            report,
        }
    }

    fn write_through(&mut self) {
        let Some(active) = self.active.as_ref() else {
            debug!("no active session; mutation kept in memory only");
            return;
        };
        // Writing before a snapshot landed would replace the stored records with a partial set.
        if !active.initialized {
            warn!(session = %active.id, user = %active.user, "records not loaded; write-through skipped");
            self.pending.push(SessionNotice::WriteFailed {
                user: active.user.clone(),
                reason: "records have not been loaded yet; the change is kept locally only"
                    .into(),
            });
            return;
        }
        if let Err(err) = self
            .context
            .persistence()
            .store_records(&active.user, self.ledger.records())
        {
            warn!(session = %active.id, user = %active.user, error = %err, "write-through failed");
            self.pending.push(SessionNotice::WriteFailed {
                user: active.user.clone(),
                reason: err.to_string(),
            });
        }
    }
}
