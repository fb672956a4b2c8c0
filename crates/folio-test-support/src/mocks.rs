//! In-memory transport with scripted failures and a call log.

use async_trait::async_trait;
use folio_ui::core::auth::{Credential, Session};
use folio_ui::core::transport::{Transport, TransportError, UploadFile};
use folio_ui::features::library::logic::format_title;
use folio_ui::models::{Resource, ResourceId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Transport call as observed by the fake backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    /// `list_resources`.
    List,
    /// `upload_resource` with the file name and token.
    Upload {
        /// File name.
        name: String,
        /// Admin token presented.
        token: String,
    },
    /// `delete_resource` with the id and token.
    Delete {
        /// Target id.
        id: String,
        /// Admin token presented.
        token: String,
    },
    /// `authorize` with the presented credential.
    Authorize {
        /// Credential value.
        credential: String,
    },
}

/// Holds one transport call open until released or dropped.
#[derive(Debug)]
pub struct Gate(oneshot::Sender<()>);

impl Gate {
    /// Let the held call finish.
    pub fn release(self) {
        let _ = self.0.send(());
    }
}

/// Fake document backend.
///
/// Unscripted calls behave like a healthy backend over an in-memory list.
/// Scripted responses are consumed first, in order, without touching that list.
/// Every call yields once to the runtime so concurrent flows interleave.
/// A listing is captured when the call is made, so a held listing returns
/// the backend as it was before anything that happened while it waited.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    stored: RefCell<Vec<Resource>>,
    lists: RefCell<VecDeque<Result<Vec<Resource>, TransportError>>>,
    uploads: RefCell<VecDeque<Result<Resource, TransportError>>>,
    deletes: RefCell<VecDeque<Result<(), TransportError>>>,
    grants: RefCell<VecDeque<Result<Session, TransportError>>>,
    list_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    upload_gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    calls: RefCell<Vec<Call>>,
    next_id: Cell<u64>,
}

impl ScriptedTransport {
    /// Empty healthy backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-populated with `resources`.
    #[must_use]
    pub fn with_stored(resources: Vec<Resource>) -> Self {
        let transport = Self::default();
        *transport.stored.borrow_mut() = resources;
        transport
    }

    /// Queue the next listing result.
    pub fn script_list(&self, result: Result<Vec<Resource>, TransportError>) {
        self.lists.borrow_mut().push_back(result);
    }

    /// Queue the next upload result.
    pub fn script_upload(&self, result: Result<Resource, TransportError>) {
        self.uploads.borrow_mut().push_back(result);
    }

    /// Queue the next delete result.
    pub fn script_delete(&self, result: Result<(), TransportError>) {
        self.deletes.borrow_mut().push_back(result);
    }

    /// Queue the next authorization result.
    pub fn script_authorize(&self, result: Result<Session, TransportError>) {
        self.grants.borrow_mut().push_back(result);
    }

    /// Hold the next listing until the returned gate is released.
    #[must_use]
    pub fn hold_next_list(&self) -> Gate {
        let (gate, held) = oneshot::channel();
        self.list_gates.borrow_mut().push_back(held);
        Gate(gate)
    }

    /// Hold the next upload until the returned gate is released.
    #[must_use]
    pub fn hold_next_upload(&self) -> Gate {
        let (gate, held) = oneshot::channel();
        self.upload_gates.borrow_mut().push_back(held);
        Gate(gate)
    }

    /// Replace the stored documents.
    pub fn set_stored(&self, resources: Vec<Resource>) {
        *self.stored.borrow_mut() = resources;
    }

    /// Stored documents, newest first.
    #[must_use]
    pub fn stored(&self) -> Vec<Resource> {
        self.stored.borrow().clone()
    }

    /// Every call observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Number of calls observed so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    async fn wait(held: Option<oneshot::Receiver<()>>) {
        if let Some(held) = held {
            let _ = held.await;
        }
    }

    fn mint_id(&self) -> String {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        format!("srv-{id}")
    }
}

/// HTTP failure with a backend message.
#[must_use]
pub fn http_error(status: u16, message: &str) -> TransportError {
    TransportError::Http {
        status,
        message: Some(message.to_string()),
    }
}

/// Connection-level failure.
#[must_use]
pub fn network_error() -> TransportError {
    TransportError::Network {
        message: "connection refused".to_string(),
    }
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
    type File = Vec<u8>;

    async fn list_resources(&self) -> Result<Vec<Resource>, TransportError> {
        self.record(Call::List);
        let scripted = self.lists.borrow_mut().pop_front();
        let listing = scripted.unwrap_or_else(|| Ok(self.stored()));
        let held = self.list_gates.borrow_mut().pop_front();
        tokio::task::yield_now().await;
        Self::wait(held).await;
        listing
    }

    async fn upload_resource(
        &self,
        file: &UploadFile<Self::File>,
        token: &str,
    ) -> Result<Resource, TransportError> {
        self.record(Call::Upload {
            name: file.name.clone(),
            token: token.to_string(),
        });
        let held = self.upload_gates.borrow_mut().pop_front();
        tokio::task::yield_now().await;
        Self::wait(held).await;
        let scripted = self.uploads.borrow_mut().pop_front();
        if let Some(result) = scripted {
            return result;
        }
        let stored = Resource {
            size_bytes: Some(file.size_bytes),
            ..Resource::uploaded(self.mint_id(), format_title(&file.name))
        };
        self.stored.borrow_mut().insert(0, stored.clone());
        Ok(stored)
    }

    async fn delete_resource(&self, id: &ResourceId, token: &str) -> Result<(), TransportError> {
        self.record(Call::Delete {
            id: id.to_string(),
            token: token.to_string(),
        });
        tokio::task::yield_now().await;
        let scripted = self.deletes.borrow_mut().pop_front();
        if let Some(result) = scripted {
            return result;
        }
        let mut stored = self.stored.borrow_mut();
        let before = stored.len();
        stored.retain(|resource| &resource.id != id);
        if stored.len() == before {
            return Err(http_error(404, "PDF not found"));
        }
        Ok(())
    }

    async fn authorize(&self, credential: &Credential) -> Result<Session, TransportError> {
        self.record(Call::Authorize {
            credential: credential.expose().to_string(),
        });
        tokio::task::yield_now().await;
        let scripted = self.grants.borrow_mut().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(Session {
                token: format!("token-{}", self.mint_id()),
                expires_at_ms: i64::MAX,
            })
        })
    }
}
