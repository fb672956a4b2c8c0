//! Contract the core requires from the HTTP layer.
//!
//! # Design
//! - The core never builds requests; it only consumes typed results.
//! - Futures are `?Send` because everything runs on the browser's single thread.
//! - The upload payload type is left to the implementation (`web_sys::File` in
//!   the browser, plain bytes in tests).

use crate::core::auth::{Credential, Session};
use crate::models::{Resource, ResourceId};
use async_trait::async_trait;
use thiserror::Error;

const GENERIC_FAILURE: &str = "Request failed. Please try again.";

/// Failure reported by the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced an HTTP response.
    #[error("network request failed: {message}")]
    Network {
        /// Platform error detail.
        message: String,
    },
    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: Option<String>,
    },
    /// The response body did not match the expected shape.
    #[error("unexpected response body: {message}")]
    Decode {
        /// Decoder error detail.
        message: String,
    },
}

impl TransportError {
    /// HTTP status, when the backend responded.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode { .. } => None,
        }
    }

    /// Message suitable for a toast: the backend's own words when it sent any.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }
}

/// File selected for upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile<F> {
    /// Name reported by the file picker.
    pub name: String,
    /// MIME type reported by the file picker.
    pub mime_type: String,
    /// Payload size in bytes.
    pub size_bytes: u64,
    /// Platform handle for the payload.
    pub body: F,
}

/// Backend operations consumed by the session store and mutation coordinator.
#[async_trait(?Send)]
pub trait Transport {
    /// Payload handle accepted by [`Transport::upload_resource`].
    type File;

    /// Fetch every stored document.
    ///
    /// # Errors
    /// Returns [`TransportError`] on network, status or decode failures.
    async fn list_resources(&self) -> Result<Vec<Resource>, TransportError>;

    /// Store a document, authenticated by the admin token.
    ///
    /// # Errors
    /// Returns [`TransportError`] on network, status or decode failures.
    async fn upload_resource(
        &self,
        file: &UploadFile<Self::File>,
        token: &str,
    ) -> Result<Resource, TransportError>;

    /// Delete a stored document, authenticated by the admin token.
    ///
    /// # Errors
    /// Returns [`TransportError`] on network or status failures.
    async fn delete_resource(&self, id: &ResourceId, token: &str) -> Result<(), TransportError>;

    /// Exchange a credential for a time-bounded admin session.
    ///
    /// # Errors
    /// Returns [`TransportError`] when the backend rejects the credential.
    async fn authorize(&self, credential: &Credential) -> Result<Session, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_backend_text() {
        let err = TransportError::Http {
            status: 413,
            message: Some("File too large".into()),
        };
        assert_eq!(err.user_message(), "File too large");
        assert_eq!(err.status(), Some(413));
    }

    #[test]
    fn user_message_falls_back_to_generic() {
        let blank = TransportError::Http {
            status: 500,
            message: Some("   ".into()),
        };
        assert_eq!(blank.user_message(), GENERIC_FAILURE);
        let network = TransportError::Network {
            message: "offline".into(),
        };
        assert_eq!(network.user_message(), GENERIC_FAILURE);
        assert_eq!(network.status(), None);
    }
}
