//! Mutation coordinator: two-phase upload and delete with rollback.
//!
//! # Design
//! - Authorization and validation run before any local state changes.
//! - Optimistic state lands in the engine before the transport is awaited.
//! - Failures roll back only the affected mutation; concurrent ones are untouched.
//! - The post-upload settle refresh is queued as data and never retried.

use crate::core::auth::Session;
use crate::core::clock::Clock;
use crate::core::config::{DEFAULT_SETTLE_DELAY_MS, DEFAULT_UPLOAD_LIMIT_BYTES, DEFAULT_UPLOAD_MIME_TYPE, FolioConfig};
use crate::core::transport::{Transport, TransportError, UploadFile};
use crate::features::library::schedule::SettleSchedule;
use crate::features::library::state::{Outcome, ReconciliationEngine};
use crate::models::{Origin, Resource, ResourceId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Input rejected before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The file is not of the accepted type.
    #[error("Only {expected} files can be uploaded (got {actual}).")]
    UnsupportedType {
        /// Accepted MIME type.
        expected: String,
        /// MIME type reported for the file.
        actual: String,
    },
    /// The file exceeds the size limit.
    #[error("File is {size_bytes} bytes; the limit is {limit_bytes} bytes.")]
    TooLarge {
        /// Reported file size.
        size_bytes: u64,
        /// Configured limit.
        limit_bytes: u64,
    },
}

/// Failure of an upload or delete request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    /// Bad input; nothing was changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// No live admin session; nothing was changed.
    #[error("Admin mode is required for this action.")]
    Unauthorized,
    /// The backend call failed and the optimistic change was rolled back.
    #[error("backend request failed: {0}")]
    Transport(#[from] TransportError),
}

impl MutationError {
    /// Message to surface to the operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Unauthorized => self.to_string(),
            Self::Transport(err) => err.user_message(),
        }
    }
}

/// Library actions surfaced to the operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LibraryAction {
    /// A document was uploaded.
    Upload,
    /// A document was removed.
    Remove,
}

/// Format a toast message for a successful action.
#[must_use]
pub fn success_message(action: LibraryAction, title: &str) -> String {
    match action {
        LibraryAction::Upload => format!("Added \"{title}\" to the library."),
        LibraryAction::Remove => format!("Removed \"{title}\" from the library."),
    }
}

/// Accepted upload shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadPolicy {
    /// Required MIME type.
    pub mime_type: String,
    /// Maximum size in bytes, inclusive.
    pub limit_bytes: u64,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            mime_type: DEFAULT_UPLOAD_MIME_TYPE.to_string(),
            limit_bytes: DEFAULT_UPLOAD_LIMIT_BYTES,
        }
    }
}

impl UploadPolicy {
    /// Check a file against the policy.
    ///
    /// # Errors
    /// Returns [`ValidationError`] describing the first violation.
    pub fn validate<F>(&self, file: &UploadFile<F>) -> Result<(), ValidationError> {
        if file.mime_type != self.mime_type {
            return Err(ValidationError::UnsupportedType {
                expected: self.mime_type.clone(),
                actual: file.mime_type.clone(),
            });
        }
        if file.size_bytes > self.limit_bytes {
            return Err(ValidationError::TooLarge {
                size_bytes: file.size_bytes,
                limit_bytes: self.limit_bytes,
            });
        }
        Ok(())
    }
}

/// Tunables for the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Upload acceptance rules.
    pub policy: UploadPolicy,
    /// Delay before the post-upload settle refresh.
    pub settle_delay_ms: u32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            policy: UploadPolicy::default(),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
        }
    }
}

impl CoordinatorSettings {
    /// Derive settings from the client configuration.
    #[must_use]
    pub fn from_config(config: &FolioConfig) -> Self {
        Self {
            policy: UploadPolicy {
                mime_type: config.upload_mime_type.clone(),
                limit_bytes: config.upload_limit_bytes,
            },
            settle_delay_ms: config.settle_delay_ms,
        }
    }
}

type ViewObserver = Rc<dyn Fn(&[Resource])>;

/// Drives uploads and deletes against the reconciliation engine.
pub struct MutationCoordinator<T: Transport> {
    transport: Rc<T>,
    clock: Rc<dyn Clock>,
    engine: RefCell<ReconciliationEngine>,
    settle: RefCell<SettleSchedule>,
    settings: CoordinatorSettings,
    observer: RefCell<Option<ViewObserver>>,
}

impl<T: Transport> MutationCoordinator<T> {
    /// Create a coordinator owning `engine`.
    #[must_use]
    pub fn new(
        transport: Rc<T>,
        clock: Rc<dyn Clock>,
        engine: ReconciliationEngine,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            transport,
            clock,
            engine: RefCell::new(engine),
            settle: RefCell::new(SettleSchedule::default()),
            settings,
            observer: RefCell::new(None),
        }
    }

    /// Register the callback that receives every new merged view.
    pub fn on_view_change(&self, observer: impl Fn(&[Resource]) + 'static) {
        *self.observer.borrow_mut() = Some(Rc::new(observer));
    }

    /// Current merged view.
    #[must_use]
    pub fn view(&self) -> Vec<Resource> {
        self.engine.borrow().view()
    }

    /// Look up a resource in the merged view.
    #[must_use]
    pub fn find(&self, id: &ResourceId) -> Option<Resource> {
        self.engine.borrow().find(id)
    }

    /// Number of unresolved or unreleased mutations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.engine.borrow().pending().len()
    }

    /// Upload a document optimistically.
    ///
    /// # Errors
    /// [`MutationError::Unauthorized`] or [`MutationError::Validation`] before
    /// any change; [`MutationError::Transport`] after rolling back.
    pub async fn upload(
        &self,
        file: &UploadFile<T::File>,
        session: Option<&Session>,
    ) -> Result<Resource, MutationError> {
        let token = self.authorized_token(session)?;
        self.settings.policy.validate(file)?;

        let placeholder = Resource::placeholder(&file.name, file.size_bytes, self.clock.now_ms());
        let handle = self.engine.borrow_mut().apply_optimistic_add(placeholder);
        self.notify();

        match self.transport.upload_resource(file, &token).await {
            Ok(stored) => {
                {
                    let mut engine = self.engine.borrow_mut();
                    engine.rebind(handle, stored.clone());
                    engine.resolve(handle, Outcome::Confirmed);
                }
                let due_at =
                    self.clock.now_ms() + i64::from(self.settings.settle_delay_ms);
                self.settle.borrow_mut().schedule(due_at);
                self.notify();
                info!(id = %stored.id, due_at, "upload confirmed");
                Ok(stored)
            }
            Err(err) => {
                self.engine.borrow_mut().resolve(handle, Outcome::Failed);
                self.notify();
                warn!(error = %err, file = %file.name, "upload rolled back");
                Err(MutationError::Transport(err))
            }
        }
    }

    /// Remove a document optimistically.
    ///
    /// Baseline entries have no backend counterpart and are removed locally.
    ///
    /// # Errors
    /// [`MutationError::Unauthorized`] before any change;
    /// [`MutationError::Transport`] after rolling back.
    pub async fn remove(
        &self,
        id: &ResourceId,
        session: Option<&Session>,
        origin: Origin,
    ) -> Result<(), MutationError> {
        let token = self.authorized_token(session)?;
        let handle = self
            .engine
            .borrow_mut()
            .apply_optimistic_remove(id.clone());

        if origin == Origin::Baseline {
            self.engine.borrow_mut().resolve(handle, Outcome::Confirmed);
            self.notify();
            debug!(%id, "baseline entry removed locally");
            return Ok(());
        }

        self.notify();
        match self.transport.delete_resource(id, &token).await {
            Ok(()) => {
                self.engine.borrow_mut().resolve(handle, Outcome::Confirmed);
                self.notify();
                info!(%id, "delete confirmed");
                Ok(())
            }
            Err(err) => {
                self.engine.borrow_mut().resolve(handle, Outcome::Failed);
                self.notify();
                warn!(error = %err, %id, "delete rolled back");
                Err(MutationError::Transport(err))
            }
        }
    }

    /// Fetch the backend listing and reconcile it.
    ///
    /// A listing overtaken by a later-issued one is dropped; the count is
    /// still returned.
    ///
    /// # Errors
    /// Returns the transport failure; local state is left untouched.
    pub async fn refresh(&self) -> Result<usize, TransportError> {
        let ticket = self.engine.borrow_mut().begin_fetch();
        let resources = self.transport.list_resources().await?;
        let count = resources.len();
        let applied = self.engine.borrow_mut().apply_fetch(ticket, resources);
        match applied {
            Some(released) => {
                self.notify();
                debug!(count, released, "library refreshed");
            }
            None => debug!(count, "superseded listing dropped"),
        }
        Ok(count)
    }

    /// Run the settle refresh if one is due. `None` when nothing was due.
    ///
    /// Due entries are coalesced into a single fetch; a failed fetch is logged
    /// and dropped.
    pub async fn settle_due(&self) -> Option<Result<usize, TransportError>> {
        let fired = self.settle.borrow_mut().take_due(self.clock.now_ms());
        if fired == 0 {
            return None;
        }
        let result = self.refresh().await;
        if let Err(err) = &result {
            warn!(error = %err, fired, "settle refresh failed");
        }
        Some(result)
    }

    /// When the next settle refresh is due, in epoch milliseconds.
    #[must_use]
    pub fn next_settle_at(&self) -> Option<i64> {
        self.settle.borrow().next_due()
    }

    fn authorized_token(&self, session: Option<&Session>) -> Result<String, MutationError> {
        let now = self.clock.now_ms();
        session
            .filter(|session| session.is_valid_at(now))
            .map(|session| session.token.clone())
            .ok_or(MutationError::Unauthorized)
    }

    fn notify(&self) {
        let observer = self.observer.borrow().clone();
        if let Some(observer) = observer {
            let view = self.view();
            observer(&view);
        }
    }
}

impl<T: Transport> fmt::Debug for MutationCoordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationCoordinator")
            .field("engine", &self.engine)
            .field("settle", &self.settle)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
