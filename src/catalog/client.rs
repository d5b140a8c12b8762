//! MangaDex implementation of [`CatalogApi`].
//!
//! Every call is a single HTTP request; there is no retry, backoff or caching.
//! Identifiers are percent-encoded as one path segment, and query parameters
//! are forwarded as given.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::UpstreamError;
use crate::session::{AccountCredentials, Session, SessionCredential};

use super::{CatalogApi, Chapter, FeedPage, QueryParams};

/// Default MangaDex API base URL.
pub const DEFAULT_API_URL: &str = "https://api.mangadex.org";

/// Default token endpoint for personal API clients.
pub const DEFAULT_AUTH_URL: &str =
    "https://auth.mangadex.org/realms/mangadex/protocol/openid-connect/token";

/// MangaDex-backed catalog client.
///
/// Attaches the bearer token held by the shared [`Session`] to each request
/// once the startup login has succeeded.
#[derive(Clone)]
pub struct MangaDexClient {
    http: Client,
    api_url: String,
    auth_url: String,
    session: Arc<Session>,
}

impl MangaDexClient {
    /// Create a client for the given endpoints.
    ///
    /// `timeout` of `None` leaves upstream calls unbounded.
    pub fn new(
        api_url: impl Into<String>,
        auth_url: impl Into<String>,
        timeout: Option<Duration>,
        session: Arc<Session>,
    ) -> Result<Self, UpstreamError> {
        let mut builder =
            Client::builder().user_agent(concat!("mangadex-facade/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth_url: auth_url.into(),
            session,
        })
    }

    /// Create a client for the public MangaDex endpoints with no timeout.
    pub fn with_defaults(session: Arc<Session>) -> Result<Self, UpstreamError> {
        Self::new(DEFAULT_API_URL, DEFAULT_AUTH_URL, None, session)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Build an API URL, encoding each segment so ids cannot escape their slot.
    ///
    /// Dot segments are refused: URL normalization would resolve them and
    /// move the request to a different upstream path.
    fn endpoint(&self, segments: &[&str]) -> Result<String, UpstreamError> {
        let mut url = self.api_url.clone();
        for segment in segments {
            if is_dot_segment(segment) {
                return Err(UpstreamError::InvalidRequest(format!(
                    "'{}' is not a valid identifier",
                    segment
                )));
            }
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        Ok(url)
    }

    /// GET an endpoint and return the success envelope.
    async fn get_envelope(
        &self,
        segments: &[&str],
        query: Option<&QueryParams>,
    ) -> Result<Value, UpstreamError> {
        let url = self.endpoint(segments)?;
        let mut request = self.http.get(&url);

        if let Some(query) = query {
            request = request.query(&query.to_pairs());
        }
        if let Some(token) = self.session.access_token().await {
            request = request.bearer_auth(token);
        }

        debug!(url = %url, "Upstream request");
        let response = request.send().await?;
        read_envelope(response).await
    }

    /// GET an endpoint and return its `data` member.
    async fn get_data(
        &self,
        segments: &[&str],
        query: Option<&QueryParams>,
    ) -> Result<Value, UpstreamError> {
        let envelope = self.get_envelope(segments, query).await?;
        take_data(envelope)
    }
}

// =============================================================================
// Upstream Payloads
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AtHomeServer {
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
struct AtHomeChapter {
    hash: String,
    data: Vec<String>,
}

impl AtHomeServer {
    fn page_urls(&self) -> Vec<String> {
        let base = self.base_url.trim_end_matches('/');
        self.chapter
            .data
            .iter()
            .map(|file| format!("{}/data/{}/{}", base, self.chapter.hash, file))
            .collect()
    }
}

// =============================================================================
// Response Handling
// =============================================================================

/// Read a response body, turning error envelopes into [`UpstreamError::Api`].
async fn read_envelope(response: Response) -> Result<Value, UpstreamError> {
    let status = response.status();
    let body = response.bytes().await?;

    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message: status_message(status),
            })
        }
        Err(e) => return Err(UpstreamError::Decode(e.to_string())),
    };

    let is_error_envelope = value.get("result").and_then(Value::as_str) == Some("error");
    if !status.is_success() || is_error_envelope {
        return Err(UpstreamError::Api {
            status: status.as_u16(),
            message: error_message(&value).unwrap_or_else(|| status_message(status)),
        });
    }

    Ok(value)
}

/// Segments that URL normalization would collapse.
pub(crate) fn is_dot_segment(segment: &str) -> bool {
    matches!(segment, "" | "." | "..")
}

fn take_data(mut envelope: Value) -> Result<Value, UpstreamError> {
    envelope
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| UpstreamError::Decode("response has no `data` member".to_string()))
}

/// Extract a human-readable message from an upstream error body.
///
/// Understands both the API envelope (`errors[0].detail` / `title`) and the
/// OAuth shape used by the auth server (`error_description` / `error`).
fn error_message(body: &Value) -> Option<String> {
    let from_envelope = body
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|first| {
            non_empty_str(first.get("detail")).or_else(|| non_empty_str(first.get("title")))
        });

    from_envelope
        .or_else(|| non_empty_str(body.get("error_description")))
        .or_else(|| non_empty_str(body.get("error")))
        .map(str::to_string)
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn status_message(status: StatusCode) -> String {
    format!("Upstream responded with {}", status)
}

// =============================================================================
// CatalogApi Implementation
// =============================================================================

#[async_trait]
impl CatalogApi for MangaDexClient {
    async fn login_personal(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<SessionCredential, UpstreamError> {
        let form = [
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
        ];

        let response = self.http.post(&self.auth_url).form(&form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|value| error_message(&value))
                .unwrap_or_else(|| status_message(status));
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let grant: TokenGrant =
            serde_json::from_slice(&body).map_err(|e| UpstreamError::Decode(e.to_string()))?;

        Ok(SessionCredential::new(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
        ))
    }

    async fn search_manga(&self, query: &QueryParams) -> Result<Value, UpstreamError> {
        self.get_data(&["manga"], Some(query)).await
    }

    async fn get_manga(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get_data(&["manga", id], None).await
    }

    async fn manga_feed(&self, id: &str, query: &QueryParams) -> Result<FeedPage, UpstreamError> {
        let envelope = self.get_envelope(&["manga", id, "feed"], Some(query)).await?;
        serde_json::from_value(envelope).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn get_chapter(&self, id: &str) -> Result<Chapter, UpstreamError> {
        let entity = self.get_data(&["chapter", id], None).await?;
        Ok(Chapter::new(id, entity))
    }

    async fn chapter_pages(&self, chapter: &Chapter) -> Result<Vec<String>, UpstreamError> {
        let envelope = self
            .get_envelope(&["at-home", "server", chapter.id()], None)
            .await?;
        let server: AtHomeServer =
            serde_json::from_value(envelope).map_err(|e| UpstreamError::Decode(e.to_string()))?;
        Ok(server.page_urls())
    }

    async fn get_author(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get_data(&["author", id], None).await
    }

    async fn get_group(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get_data(&["group", id], None).await
    }

    async fn search_covers(&self, query: &QueryParams) -> Result<Value, UpstreamError> {
        self.get_data(&["cover"], Some(query)).await
    }

    async fn get_cover(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get_data(&["cover", id], None).await
    }

    async fn all_tags(&self) -> Result<Value, UpstreamError> {
        self.get_data(&["manga", "tag"], None).await
    }

    async fn get_list(&self, id: &str) -> Result<Value, UpstreamError> {
        self.get_data(&["list", id], None).await
    }
}
