//! Session provider contract.
//!
//! The authentication handshake lives elsewhere; the note manager only needs
//! to know who the current owner is and whether the session is still
//! resolving. Changes are broadcast over a `watch` channel.

use postit_core::OwnerId;
use tokio::sync::watch;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub owner_id: Option<OwnerId>,
    pub loading: bool,
}

impl SessionState {
    /// Session still resolving; no owner known yet.
    pub fn loading() -> Self {
        Self {
            owner_id: None,
            loading: true,
        }
    }

    pub fn ready(owner_id: OwnerId) -> Self {
        Self {
            owner_id: Some(owner_id),
            loading: false,
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    /// The owner, if store calls are currently permitted.
    pub fn active_owner(&self) -> Option<&OwnerId> {
        if self.loading {
            None
        } else {
            self.owner_id.as_ref()
        }
    }
}

/// Publishes session changes to subscribers.
#[derive(Debug)]
pub struct SessionProvider {
    sender: watch::Sender<SessionState>,
}

impl SessionProvider {
    pub fn new(initial: SessionState) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Provider for a session that is already established.
    pub fn ready(owner_id: OwnerId) -> Self {
        Self::new(SessionState::ready(owner_id))
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.sender.borrow().clone()
    }

    /// Mark the session as resolving, keeping the current owner.
    pub fn set_loading(&self) {
        self.sender.send_modify(|state| state.loading = true);
    }

    pub fn sign_in(&self, owner_id: OwnerId) {
        self.sender.send_replace(SessionState::ready(owner_id));
    }

    pub fn sign_out(&self) {
        self.sender.send_replace(SessionState::signed_out());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(raw: &str) -> OwnerId {
        OwnerId::parse(raw).unwrap()
    }

    #[test]
    fn test_active_owner_requires_ready_session() {
        assert!(SessionState::loading().active_owner().is_none());
        assert!(SessionState::signed_out().active_owner().is_none());

        let mut state = SessionState::ready(owner("u1"));
        assert_eq!(state.active_owner(), Some(&owner("u1")));

        state.loading = true;
        assert!(state.active_owner().is_none());
    }

    #[test]
    fn test_provider_broadcasts_changes() {
        let provider = SessionProvider::new(SessionState::loading());
        let mut rx = provider.subscribe();

        provider.sign_in(owner("u1"));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SessionState::ready(owner("u1")));

        provider.set_loading();
        assert_eq!(rx.borrow().owner_id, Some(owner("u1")));
        assert!(rx.borrow().loading);

        provider.sign_out();
        assert_eq!(provider.current(), SessionState::signed_out());
    }
}
