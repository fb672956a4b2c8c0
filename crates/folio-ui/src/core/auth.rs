//! Admin session store.
//!
//! # Design
//! - Hold the session as plain data; expiry is evaluated lazily on every read, never by a timer.
//! - Observers hear about the authorized flag only when it flips.
//! - Only the navigation mapper acquires or revokes, so those entry points are crate-private.
//! - Persisted state is written and cleared as one pair.

use crate::core::clock::Clock;
use crate::core::storage::KeyValueStore;
use crate::core::transport::Transport;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, warn};

/// Storage key holding the admin token.
pub const TOKEN_KEY: &str = "adminToken";
/// Storage key holding the token expiry as epoch milliseconds.
pub const EXPIRES_KEY: &str = "adminTokenExpires";

/// Opaque credential exchanged for an admin session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a credential value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the secret for the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Time-bounded admin session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Token attached to mutating requests.
    pub token: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at_ms: i64,
}

impl Session {
    /// Whether the session is still usable at `now_ms`.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        !self.token.is_empty() && now_ms < self.expires_at_ms
    }
}

/// Failures while acquiring a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The backend refused the credential (or granted an unusable session).
    #[error("admin authorization rejected: {message}")]
    Rejected {
        /// Reason reported by the backend.
        message: String,
    },
    /// No credential is configured for this client.
    #[error("no admin credential configured")]
    MissingCredential,
}

/// Handle returned by [`SessionStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Rc<dyn Fn(bool)>;

/// Single source of truth for admin authorization.
pub struct SessionStore {
    storage: Rc<dyn KeyValueStore>,
    clock: Rc<dyn Clock>,
    session: RefCell<Option<Session>>,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_subscription: Cell<u64>,
    authorized: Cell<bool>,
}

impl SessionStore {
    /// Create an empty, unauthorized store.
    #[must_use]
    pub fn new(storage: Rc<dyn KeyValueStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            session: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            authorized: Cell::new(false),
        }
    }

    /// Hydrate from persisted state after a page reload.
    ///
    /// Returns `true` when a live session was restored. Incomplete, malformed
    /// or expired pairs are ignored.
    pub fn restore(&self) -> bool {
        let (Some(token), Some(expires)) = (
            self.storage.get(TOKEN_KEY),
            self.storage.get(EXPIRES_KEY),
        ) else {
            return false;
        };
        let Ok(expires_at_ms) = expires.trim().parse::<i64>() else {
            warn!(key = EXPIRES_KEY, "ignoring unparsable persisted session expiry");
            return false;
        };
        let session = Session {
            token,
            expires_at_ms,
        };
        if !session.is_valid_at(self.clock.now_ms()) {
            debug!(expires_at_ms, "persisted session already expired");
            return false;
        }
        *self.session.borrow_mut() = Some(session);
        self.publish(true);
        true
    }

    /// The live session, or `None` when absent or expired.
    pub fn current(&self) -> Option<Session> {
        let now = self.clock.now_ms();
        let live = self
            .session
            .borrow()
            .as_ref()
            .filter(|session| session.is_valid_at(now))
            .cloned();
        self.publish(live.is_some());
        live
    }

    /// Whether a live session exists right now.
    pub fn is_authorized(&self) -> bool {
        self.current().is_some()
    }

    /// Exchange a credential for a session and persist it.
    pub(crate) async fn acquire<T: Transport + ?Sized>(
        &self,
        transport: &T,
        credential: &Credential,
    ) -> Result<Session, AuthError> {
        let result = transport.authorize(credential).await;
        let session = match result {
            Ok(session) if session.is_valid_at(self.clock.now_ms()) => session,
            Ok(session) => {
                self.clear();
                warn!(
                    expires_at_ms = session.expires_at_ms,
                    "admin grant arrived unusable"
                );
                return Err(AuthError::Rejected {
                    message: "granted session is already expired".to_string(),
                });
            }
            Err(err) => {
                self.clear();
                warn!(error = %err, "admin authorization failed");
                return Err(AuthError::Rejected {
                    message: err.user_message(),
                });
            }
        };
        self.persist(&session);
        *self.session.borrow_mut() = Some(session.clone());
        debug!(expires_at_ms = session.expires_at_ms, "admin session acquired");
        self.publish(true);
        Ok(session)
    }

    /// Drop the session and its persisted copy. Idempotent.
    pub(crate) fn revoke(&self) {
        self.clear();
        debug!("admin session revoked");
    }

    /// Register an observer for authorized-flag changes.
    pub fn subscribe(&self, observer: impl Fn(bool) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    /// Remove an observer. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    fn clear(&self) {
        self.session.borrow_mut().take();
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(EXPIRES_KEY);
        self.publish(false);
    }

    fn persist(&self, session: &Session) {
        let written = self
            .storage
            .set(TOKEN_KEY, &session.token)
            .and_then(|()| {
                self.storage
                    .set(EXPIRES_KEY, &session.expires_at_ms.to_string())
            });
        if let Err(err) = written {
            warn!(error = %err, "admin session kept in memory only");
            self.storage.remove(TOKEN_KEY);
            self.storage.remove(EXPIRES_KEY);
        }
    }

    fn publish(&self, authorized: bool) {
        if self.authorized.replace(authorized) == authorized {
            return;
        }
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(authorized);
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authorized", &self.authorized.get())
            .field("observers", &self.observers.borrow().len())
            .finish_non_exhaustive()
    }
}
