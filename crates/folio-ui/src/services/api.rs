//! HTTP transport for the document backend (REST over gloo-net).

use crate::core::auth::{Credential, Session};
use crate::core::transport::{Transport, TransportError, UploadFile};
use crate::models::{Resource, ResourceId};
use async_trait::async_trait;
use folio_api_models::{
    AdminSessionRequest, AdminSessionResponse, ErrorBody, PdfDeleteResponse, PdfListResponse,
    PdfUploadResponse,
};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use web_sys::FormData;

/// Header carrying the admin token on mutating requests.
pub const ADMIN_TOKEN_HEADER: &str = "x-folio-admin-token";
/// Multipart field holding the uploaded document.
pub const UPLOAD_FIELD: &str = "pdf";

/// [`Transport`] backed by `fetch`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    base_url: String,
}

impl HttpTransport {
    /// Client rooted at `base_url` (trailing slash ignored).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait(?Send)]
impl Transport for HttpTransport {
    type File = web_sys::File;

    async fn list_resources(&self) -> Result<Vec<Resource>, TransportError> {
        let response = Request::get(&self.url("/pdfs"))
            .send()
            .await
            .map_err(network)?;
        let body: PdfListResponse = decode(response).await?;
        Ok(body
            .pdfs
            .into_iter()
            .map(|record| Resource::from_record(record, &self.base_url))
            .collect())
    }

    async fn upload_resource(
        &self,
        file: &UploadFile<Self::File>,
        token: &str,
    ) -> Result<Resource, TransportError> {
        let form = FormData::new().map_err(|err| TransportError::Network {
            message: format!("form-data failed: {err:?}"),
        })?;
        form.append_with_blob_and_filename(UPLOAD_FIELD, &file.body, &file.name)
            .map_err(|err| TransportError::Network {
                message: format!("attach file: {err:?}"),
            })?;
        let response = Request::post(&self.url("/upload-pdf"))
            .header(ADMIN_TOKEN_HEADER, token)
            .body(form)
            .send()
            .await
            .map_err(network)?;
        let body: PdfUploadResponse = decode(response).await?;
        Ok(Resource::from_record(body.data, &self.base_url))
    }

    async fn delete_resource(&self, id: &ResourceId, token: &str) -> Result<(), TransportError> {
        let path = format!("/pdfs/{}", urlencoding::encode(id.as_str()));
        let response = Request::delete(&self.url(&path))
            .header(ADMIN_TOKEN_HEADER, token)
            .send()
            .await
            .map_err(network)?;
        let body: PdfDeleteResponse = decode(response).await?;
        if body.confirms(id.as_str()) {
            Ok(())
        } else {
            Err(TransportError::Decode {
                message: format!("delete acknowledged {} instead of {id}", body.id),
            })
        }
    }

    async fn authorize(&self, credential: &Credential) -> Result<Session, TransportError> {
        let request = Request::post(&self.url("/admin/session"))
            .json(&AdminSessionRequest {
                credential: credential.expose().to_string(),
            })
            .map_err(network)?;
        let response = request.send().await.map_err(network)?;
        let body: AdminSessionResponse = decode(response).await?;
        Ok(Session {
            token: body.token,
            expires_at_ms: body.expires_at_epoch_millis,
        })
    }
}

fn network(err: gloo_net::Error) -> TransportError {
    TransportError::Network {
        message: err.to_string(),
    }
}

async fn ensure_success(response: Response) -> Result<Response, TransportError> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let message = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(ErrorBody::into_message);
    Err(TransportError::Http { status, message })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    ensure_success(response)
        .await?
        .json::<T>()
        .await
        .map_err(|err| TransportError::Decode {
            message: err.to_string(),
        })
}
