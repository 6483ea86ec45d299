//! Session plumbing: identity events in, one ledger per signed-in user out.

pub mod identity;
pub mod ledger_session;

use std::sync::Arc;

use crate::{
    storage::PersistenceProvider,
    time::{Clock, SystemClock},
};

pub use identity::{IdentityProvider, LocalIdentity, SessionEvent, UserId};
pub use ledger_session::{LedgerSession, SessionNotice};

/// Collaborators shared by everything that observes the signed-in user's ledger.
///
/// Built once by the host and passed explicitly; nothing reaches for a global handle.
#[derive(Clone)]
pub struct SessionContext {
    identity: Arc<dyn IdentityProvider>,
    persistence: Arc<dyn PersistenceProvider>,
    clock: Arc<dyn Clock>,
}

impl SessionContext {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        persistence: Arc<dyn PersistenceProvider>,
    ) -> Self {
        Self {
            identity,
            persistence,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    pub fn persistence(&self) -> &Arc<dyn PersistenceProvider> {
        &self.persistence
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
