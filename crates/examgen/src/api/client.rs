//! Authenticated HTTP core shared by every backend call.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::session::SessionStore;

/// Default connect timeout for HTTP requests (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests (30 seconds). Uploads override
/// this with their own explicit deadline.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionStore>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::NetworkUnreachable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Absolute URLs pass through; rooted and bare paths join the base URL.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if let Some(rooted) = path.strip_prefix('/') {
            format!("{}/{}", self.base_url, rooted)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Appends a `t=<unix millis>` parameter so intermediaries never serve a
    /// stale artifact for a URL whose content changes across calls.
    pub fn append_cache_buster(url: &str) -> String {
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}t={}", chrono::Utc::now().timestamp_millis())
    }

    /// Builds a request with the bearer token attached when one is present.
    /// Anonymous flows simply omit the header.
    pub fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, self.resolve_url(path));
        // Read fresh on every request; the token may have been replaced by
        // another instance sharing the profile.
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(reqwest::Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(reqwest::Method::POST, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(reqwest::Method::DELETE, path)
    }

    /// Maps a non-success response to the error taxonomy, consuming the body
    /// as the technical detail. A 401 also clears the stored token.
    pub async fn classify_response(&self, response: Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        self.classify_status(status, body)
    }

    pub fn classify_status(&self, status: StatusCode, body: String) -> ApiError {
        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.set_token(None);
                ApiError::Unauthorized
            }
            StatusCode::FORBIDDEN => ApiError::PermissionDenied(body),
            StatusCode::NOT_FOUND => ApiError::EndpointNotFound,
            // The server's cap tripped; the sizes are unknown at this layer.
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::FileTooLarge {
                size: None,
                limit: None,
            },
            s if s.is_server_error() => ApiError::ServerFault {
                status: s.as_u16(),
                body,
            },
            s => ApiError::RequestRejected {
                status: s.as_u16(),
                body,
            },
        }
    }

    /// Sends a request and decodes a JSON body, folding transport failures
    /// and HTTP error statuses into the taxonomy.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, context))?;

        if !response.status().is_success() {
            return Err(self.classify_response(response).await);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, context))?;
        decode_body(status, &body, context)
    }

    /// Sends a request where only success/failure matters.
    pub async fn send_unit(&self, builder: RequestBuilder, context: &str) -> Result<()> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, context))?;

        if !response.status().is_success() {
            return Err(self.classify_response(response).await);
        }
        Ok(())
    }
}

/// Decodes a success body. Some backend revisions answer unit-ish calls
/// with an empty body; that decodes as an empty object so response types
/// with fully defaulted fields still parse. Anything else that fails to
/// decode is a protocol violation, not a connectivity problem.
fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str, context: &str) -> Result<T> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(body).map_err(|e| ApiError::RequestRejected {
        status: status.as_u16(),
        body: format!("{context}: invalid response body\n{e}"),
    })
}
