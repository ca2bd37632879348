use super::Permissions;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::watch;

/// The identity behind a signed-in context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub account_id: u64,
    /// Email address, normalized to lowercase.
    pub email: String,
}

/// Auth state observed by subscribers. A fresh subscription yields the
/// current value immediately, then a new value on every sign-in or
/// sign-out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthState {
    SignedOut,
    SignedIn(Identity),
}

/// One signed-in context, alive from link redemption until sign-out or
/// expiry.
pub struct Session {
    pub identity: Identity,
    pub created_at: chrono::DateTime<Utc>,
    /// `None` means the session never expires.
    expire_time: Option<chrono::NaiveDateTime>,
    /// Memoized permission resolution for this identity only. Explicit
    /// lookups of other users never touch it.
    permissions: RwLock<Option<Permissions>>,
}

impl Session {
    fn new(identity: Identity) -> Self {
        let expire_days = crate::config::INSTANCE.sign_in.session_expire_days;
        Self {
            identity,
            created_at: Utc::now(),
            expire_time: if expire_days == 0 {
                None
            } else {
                Some(Utc::now().naive_utc() + chrono::Days::new(expire_days as u64))
            },
            permissions: RwLock::new(None),
        }
    }

    /// Whether this session was expired.
    pub fn is_expired(&self) -> bool {
        self.expire_time
            .map_or(false, |expire| expire <= Utc::now().naive_utc())
    }

    /// The memoized permission set, if one was resolved.
    pub fn cached_permissions(&self) -> Option<Permissions> {
        self.permissions.read().clone()
    }

    /// Memoize a resolved permission set.
    pub fn cache_permissions(&self, permissions: Permissions) {
        *self.permissions.write() = Some(permissions);
    }

    /// Drop the memoized permission set.
    pub fn clear_permissions_cache(&self) {
        *self.permissions.write() = None;
    }
}

/// Holds every live session, keyed by an opaque token.
pub struct SessionManager {
    sessions: DashMap<String, Arc<Session>>,
    state_tx: watch::Sender<AuthState>,
}

impl SessionManager {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(AuthState::SignedOut);
        Self {
            sessions: DashMap::new(),
            state_tx,
        }
    }

    /// Establish a session for an identity and hand back its token.
    pub fn sign_in(&self, identity: Identity) -> (String, Arc<Session>) {
        let token = {
            let mut rng = rand::thread_rng();
            sha256::digest(format!(
                "{}-{:?}-{}",
                identity.account_id,
                Utc::now().naive_utc(),
                rng.gen::<u128>()
            ))
        };
        let session = Arc::new(Session::new(identity.clone()));
        self.sessions.insert(token.clone(), session.clone());
        // send_replace stores the state even with no subscriber alive
        self.state_tx.send_replace(AuthState::SignedIn(identity));
        (token, session)
    }

    /// Resolve the live session behind a token. Expired sessions read as
    /// signed-out and are dropped on the way.
    pub fn attach(&self, token: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(token).map(|session| session.clone())?;
        if session.is_expired() {
            self.sessions.remove(token);
            return None;
        }
        Some(session)
    }

    /// Last-known identity for a token, without I/O.
    pub fn current(&self, token: &str) -> Option<Identity> {
        self.attach(token).map(|session| session.identity.clone())
    }

    /// Revoke a session. Its permission cache is cleared before this
    /// returns, so a later resolution can only see the next identity.
    pub fn sign_out(&self, token: &str) -> bool {
        match self.sessions.remove(token) {
            Some((_, session)) => {
                session.clear_permissions_cache();
                self.state_tx.send_replace(AuthState::SignedOut);
                true
            }
            None => false,
        }
    }

    /// Subscribe to auth-state changes. The receiver observes the current
    /// state right away, then every later transition.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state_tx.subscribe()
    }

    /// Drop expired sessions.
    pub fn refresh(&self) {
        self.sessions.retain(|_, session| !session.is_expired());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            account_id: 123456,
            email: "alice@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn subscribe_sees_current_state_immediately() {
        let manager = SessionManager::new();
        assert_eq!(*manager.subscribe().borrow(), AuthState::SignedOut);

        let (token, _) = manager.sign_in(identity());
        assert_eq!(
            *manager.subscribe().borrow(),
            AuthState::SignedIn(identity())
        );

        assert!(manager.sign_out(&token));
        assert_eq!(*manager.subscribe().borrow(), AuthState::SignedOut);
    }

    #[tokio::test]
    async fn sign_out_revokes_and_clears_cache() {
        let manager = SessionManager::new();
        let (token, session) = manager.sign_in(identity());

        session.cache_permissions(vec!["home".to_string()]);
        assert!(manager.attach(&token).is_some());
        assert_eq!(manager.current(&token), Some(identity()));

        assert!(manager.sign_out(&token));
        assert!(manager.attach(&token).is_none());
        assert_eq!(manager.current(&token), None);
        assert!(session.cached_permissions().is_none());
        assert!(!manager.sign_out(&token));
    }
}
