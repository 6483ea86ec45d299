//! Identity collaborator: who is signed in, announced as session events.

use std::{
    fmt,
    sync::{
        mpsc::{self, Receiver, Sender},
        Mutex,
    },
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{LedgerError, Result};

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SessionStarted(UserId),
    SessionEnded,
}

/// Source of sign-in/sign-out transitions.
pub trait IdentityProvider: Send + Sync {
    /// Opens a subscription. The subscriber first receives the current state (a
    /// `SessionStarted` if someone is signed in) followed by every later transition.
    /// Dropping the receiver unsubscribes.
    fn subscribe(&self) -> Result<Receiver<SessionEvent>>;

    fn current_user(&self) -> Option<UserId>;
}

#[derive(Default)]
struct IdentityState {
    current: Option<UserId>,
    subscribers: Vec<Sender<SessionEvent>>,
}

/// In-process identity provider driven by explicit sign-in/sign-out calls.
#[derive(Default)]
pub struct LocalIdentity {
    state: Mutex<IdentityState>,
}

impl LocalIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signs `user` in, ending any session that was active for someone else.
    pub fn sign_in(&self, user: impl Into<UserId>) -> Result<()> {
        let user = user.into();
        let mut state = self.lock()?;
        if state.current.as_ref() == Some(&user) {
            return Ok(());
        }
        if state.current.take().is_some() {
            broadcast(&mut state.subscribers, SessionEvent::SessionEnded);
        }
        info!(user = %user, "user signed in");
        state.current = Some(user.clone());
        broadcast(&mut state.subscribers, SessionEvent::SessionStarted(user));
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        let mut state = self.lock()?;
        if let Some(user) = state.current.take() {
            info!(user = %user, "user signed out");
            broadcast(&mut state.subscribers, SessionEvent::SessionEnded);
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, IdentityState>> {
        self.state
            .lock()
            .map_err(|_| LedgerError::Identity("identity state lock poisoned".into()))
    }
}

impl IdentityProvider for LocalIdentity {
    fn subscribe(&self) -> Result<Receiver<SessionEvent>> {
        let (sender, receiver) = mpsc::channel();
        let mut state = self.lock()?;
        if let Some(user) = state.current.clone() {
            // The receiver is still held here, so this cannot fail.
            let _ = sender.send(SessionEvent::SessionStarted(user));
        }
        state.subscribers.push(sender);
        Ok(receiver)
    }

    fn current_user(&self) -> Option<UserId> {
        self.lock().ok().and_then(|state| state.current.clone())
    }
}

fn broadcast(subscribers: &mut Vec<Sender<SessionEvent>>, event: SessionEvent) {
    subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn late_subscriber_sees_current_session() {
        let identity = LocalIdentity::new();
        identity.sign_in("alice").unwrap();
        let events = identity.subscribe().unwrap();
        assert_eq!(
            events.try_recv().unwrap(),
            SessionEvent::SessionStarted(UserId::from("alice"))
        );
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn switching_users_ends_the_previous_session_first() {
        let identity = LocalIdentity::new();
        let events = identity.subscribe().unwrap();
        identity.sign_in("alice").unwrap();
        identity.sign_in("bob").unwrap();
        identity.sign_out().unwrap();
        identity.sign_out().unwrap();

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(
            received,
            vec![
                SessionEvent::SessionStarted(UserId::from("alice")),
                SessionEvent::SessionEnded,
                SessionEvent::SessionStarted(UserId::from("bob")),
                SessionEvent::SessionEnded,
            ]
        );
        assert_eq!(identity.current_user(), None);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let identity = LocalIdentity::new();
        drop(identity.subscribe().unwrap());
        identity.sign_in("carol").unwrap();
        assert!(identity.lock().unwrap().subscribers.is_empty());
    }
}
