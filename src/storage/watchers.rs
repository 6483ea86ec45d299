use std::{
    collections::HashMap,
    sync::{
        mpsc::{self, Receiver, Sender},
        Mutex,
    },
};

use super::SnapshotUpdate;
use crate::{
    errors::{LedgerError, Result},
    session::UserId,
};

/// Per-user fan-out of snapshot pushes to live subscribers.
#[derive(Default)]
pub(crate) struct WatcherRegistry {
    watchers: Mutex<HashMap<UserId, Vec<Sender<SnapshotUpdate>>>>,
}

impl WatcherRegistry {
    pub fn subscribe(&self, user: &UserId) -> Result<Receiver<SnapshotUpdate>> {
        let (sender, receiver) = mpsc::channel();
        self.watchers
            .lock()
            .map_err(|_| LedgerError::Persistence("watcher registry lock poisoned".into()))?
            .entry(user.clone())
            .or_default()
            .push(sender);
        Ok(receiver)
    }

    /// Delivers `update` to every subscriber of `user`, forgetting the ones that hung up.
    pub fn notify(&self, user: &UserId, update: SnapshotUpdate) -> Result<usize> {
        let mut watchers = self
            .watchers
            .lock()
            .map_err(|_| LedgerError::Persistence("watcher registry lock poisoned".into()))?;
        let Some(senders) = watchers.get_mut(user) else {
            return Ok(0);
        };
        senders.retain(|sender| sender.send(update.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            watchers.remove(user);
        }
        Ok(delivered)
    }
}
