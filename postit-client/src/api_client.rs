//! REST implementation of the note store.

use crate::config::{AuthConfig, ClientConfig};
use async_trait::async_trait;
use postit_core::{Note, NoteId, OwnerId, StoreError, StoreResult};
use postit_store::NoteStore;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure to build the client. Call failures are [`StoreError`]s.
#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Config error: {0}")]
    Config(String),
}

#[derive(Debug, Deserialize)]
struct NoteList {
    notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
struct CreateNoteRequest<'a> {
    owner_id: &'a OwnerId,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateNoteRequest<'a> {
    text: &'a str,
}

/// Error body returned by the notes API.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    message: String,
}

#[derive(Clone)]
pub struct RestNoteStore {
    client: reqwest::Client,
    base_url: Url,
    auth_header: HeaderMap,
    request_timeout_ms: u64,
}

impl RestNoteStore {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base_url = Url::parse(config.api_base_url.trim())
            .map_err(|e| ApiClientError::Config(format!("api_base_url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::Config(format!(
                "api_base_url: {} cannot carry a path",
                base_url
            )));
        }

        let auth_header = build_auth_headers(&config.auth)?;
        Ok(Self {
            client,
            base_url,
            auth_header,
            request_timeout_ms: config.request_timeout_ms,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn url(&self, segments: &[&str]) -> StoreResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::Network {
                reason: format!("base URL {} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn note_url(&self, id: &NoteId) -> StoreResult<Url> {
        self.url(&["v1", "notes", id.as_str()])
    }

    /// Send a request and check its status. `target` names the note the
    /// request addresses, so a 404 can be reported as that note missing.
    async fn send(&self, request: RequestBuilder, target: Option<&NoteId>) -> StoreResult<Response> {
        let response = request
            .headers(self.auth_header.clone())
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, target) {
            return Err(StoreError::NotFound { id: id.clone() });
        }
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(StoreError::Unavailable);
        }

        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        let message = match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(api_error) => format!("{}: {}", api_error.code, api_error.message),
            Err(_) => text,
        };
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> StoreResult<T> {
        let body = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        serde_json::from_slice(&body).map_err(|err| StoreError::InvalidResponse {
            reason: err.to_string(),
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout {
                after_ms: self.request_timeout_ms,
            }
        } else {
            StoreError::Network {
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl NoteStore for RestNoteStore {
    async fn list(&self, owner_id: &OwnerId) -> StoreResult<Vec<Note>> {
        tracing::debug!(owner_id = %owner_id, "GET /v1/notes");
        let request = self
            .client
            .get(self.url(&["v1", "notes"])?)
            .query(&[("owner_id", owner_id.as_str())]);
        let response = self.send(request, None).await?;
        let list: NoteList = self.parse_response(response).await?;
        Ok(list.notes)
    }

    async fn create(&self, owner_id: &OwnerId, text: &str) -> StoreResult<Note> {
        tracing::debug!(owner_id = %owner_id, "POST /v1/notes");
        let request = self
            .client
            .post(self.url(&["v1", "notes"])?)
            .json(&CreateNoteRequest { owner_id, text });
        let response = self.send(request, None).await?;
        self.parse_response(response).await
    }

    async fn update(&self, id: &NoteId, text: &str) -> StoreResult<Note> {
        tracing::debug!(note_id = %id, "PATCH /v1/notes/{{id}}");
        let request = self
            .client
            .patch(self.note_url(id)?)
            .json(&UpdateNoteRequest { text });
        let response = self.send(request, Some(id)).await?;
        self.parse_response(response).await
    }

    async fn delete(&self, id: &NoteId) -> StoreResult<()> {
        tracing::debug!(note_id = %id, "DELETE /v1/notes/{{id}}");
        let request = self.client.delete(self.note_url(id)?);
        self.send(request, Some(id)).await?;
        Ok(())
    }
}

fn build_auth_headers(auth: &AuthConfig) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(api_key) = &auth.api_key {
        headers.insert(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(api_key).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    if let Some(jwt) = &auth.jwt {
        let value = format!("Bearer {}", jwt);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
