//! Route-to-mode mapping and the admin-session navigation hook.
//!
//! # Design
//! - `classify` is pure; the navigator is the only component that acquires or revokes sessions.
//! - Entering the privileged prefix acquires once; leaving it revokes.
//! - Every section has a privileged twin so the shell can move around without leaving the prefix.
//! - No borrow is held across the credential exchange.

use crate::core::auth::{AuthError, Credential, SessionStore};
use crate::core::transport::Transport;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};
use yew_router::prelude::*;

/// Path prefix that grants admin mode while visited.
pub const PRIVILEGED_PREFIX: &str = "/admin";

/// Library section derived from the current path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// Every document.
    #[default]
    Library,
    /// Uploaded documents only.
    Recent,
    /// Informational page, no documents.
    About,
}

/// Client route table.
#[derive(Clone, Routable, PartialEq, Eq, Debug)]
pub enum Route {
    /// Full library.
    #[at("/")]
    Library,
    /// Recent uploads.
    #[at("/recent")]
    Recent,
    /// About page.
    #[at("/about")]
    About,
    /// Single document detail.
    #[at("/pdf/:id")]
    Document {
        /// Document identifier.
        id: String,
    },
    /// Full library in admin mode.
    #[at("/admin")]
    AdminLibrary,
    /// Recent uploads in admin mode.
    #[at("/admin/recent")]
    AdminRecent,
    /// About page in admin mode.
    #[at("/admin/about")]
    AdminAbout,
    /// Single document detail in admin mode.
    #[at("/admin/pdf/:id")]
    AdminDocument {
        /// Document identifier.
        id: String,
    },
    /// Anything else.
    #[not_found]
    #[at("/404")]
    NotFound,
}

impl Route {
    /// Link target for a section, keeping the privileged prefix when `privileged`.
    #[must_use]
    pub const fn for_section(mode: DisplayMode, privileged: bool) -> Self {
        match (mode, privileged) {
            (DisplayMode::Library, false) => Self::Library,
            (DisplayMode::Recent, false) => Self::Recent,
            (DisplayMode::About, false) => Self::About,
            (DisplayMode::Library, true) => Self::AdminLibrary,
            (DisplayMode::Recent, true) => Self::AdminRecent,
            (DisplayMode::About, true) => Self::AdminAbout,
        }
    }

    /// Link target for a document detail page.
    #[must_use]
    pub fn document(id: impl Into<String>, privileged: bool) -> Self {
        let id = id.into();
        if privileged {
            Self::AdminDocument { id }
        } else {
            Self::Document { id }
        }
    }

    /// Section named by the route, if it names one.
    #[must_use]
    pub const fn section(&self) -> Option<DisplayMode> {
        match self {
            Self::Library | Self::AdminLibrary => Some(DisplayMode::Library),
            Self::Recent | Self::AdminRecent => Some(DisplayMode::Recent),
            Self::About | Self::AdminAbout => Some(DisplayMode::About),
            Self::Document { .. } | Self::AdminDocument { .. } | Self::NotFound => None,
        }
    }
}

/// Whether a path lies under the privileged prefix.
#[must_use]
pub fn is_privileged(path: &str) -> bool {
    path.starts_with(PRIVILEGED_PREFIX)
}

/// Resolve a raw location (query and fragment allowed) against the route table.
#[must_use]
pub fn recognize(path: &str) -> Route {
    let without_fragment = path.split('#').next().unwrap_or_default();
    let pathname = without_fragment.split('?').next().unwrap_or_default();
    let trimmed = pathname.trim_end_matches('/');
    if trimmed.is_empty() {
        return Route::Library;
    }
    Route::recognize(trimmed).unwrap_or(Route::NotFound)
}

/// Derive the display mode for a path.
#[must_use]
pub fn classify(path: &str) -> DisplayMode {
    if is_privileged(path) {
        return DisplayMode::Library;
    }
    recognize(path).section().unwrap_or_default()
}

/// Effect of a navigation on the admin session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionTransition {
    /// Privilege boundary not crossed.
    Unchanged,
    /// Entered the privileged prefix and obtained a session.
    Acquired,
    /// Entered the privileged prefix but the exchange failed.
    Rejected(AuthError),
    /// Left the privileged prefix; the session was dropped.
    Revoked,
}

/// Result of handling one navigation event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// Mode the library should display.
    pub mode: DisplayMode,
    /// Recognised route.
    pub route: Route,
    /// Session side effect.
    pub session: SessionTransition,
}

/// Drives session acquisition and revocation from navigation events.
#[derive(Debug)]
pub struct Navigator {
    session: Rc<SessionStore>,
    credential: Option<Credential>,
    previous: RefCell<Option<String>>,
    mode: Cell<DisplayMode>,
}

impl Navigator {
    /// Create a navigator that presents `credential` when entering admin mode.
    #[must_use]
    pub fn new(session: Rc<SessionStore>, credential: Option<Credential>) -> Self {
        Self {
            session,
            credential,
            previous: RefCell::new(None),
            mode: Cell::new(DisplayMode::Library),
        }
    }

    /// Mode derived from the most recent navigation.
    #[must_use]
    pub fn mode(&self) -> DisplayMode {
        self.mode.get()
    }

    /// Handle a navigation event.
    ///
    /// Under the privileged prefix the mode follows the last section the path
    /// named, starting from the library.
    pub async fn on_navigate<T: Transport + ?Sized>(
        &self,
        path: &str,
        transport: &T,
    ) -> NavigationOutcome {
        let privileged = is_privileged(path);
        let was_privileged = self
            .previous
            .replace(Some(path.to_string()))
            .as_deref()
            .is_some_and(is_privileged);
        let route = recognize(path);
        let mode = if privileged {
            route.section().unwrap_or(if was_privileged {
                self.mode.get()
            } else {
                DisplayMode::Library
            })
        } else {
            classify(path)
        };
        self.mode.set(mode);

        let session = if privileged && !was_privileged {
            self.enter_privileged(transport).await
        } else if was_privileged && !privileged {
            self.session.revoke();
            SessionTransition::Revoked
        } else {
            SessionTransition::Unchanged
        };
        debug!(path, ?mode, ?session, "navigation handled");
        NavigationOutcome {
            mode,
            route,
            session,
        }
    }

    async fn enter_privileged<T: Transport + ?Sized>(&self, transport: &T) -> SessionTransition {
        let Some(credential) = self.credential.as_ref() else {
            warn!("admin location visited without a configured credential");
            return SessionTransition::Rejected(AuthError::MissingCredential);
        };
        match self.session.acquire(transport, credential).await {
            Ok(_) => SessionTransition::Acquired,
            Err(err) => SessionTransition::Rejected(err),
        }
    }
}
