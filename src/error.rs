use thiserror::Error;

/// Errors raised by a catalog gateway call.
///
/// This is the single failure class surfaced to facade clients: every variant
/// is normalized to the same `500 {"error": ...}` response.
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// Network or connection error talking to the upstream API
    #[error("Connection error: {0}")]
    Transport(String),

    /// Upstream answered with an error envelope or a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Upstream body could not be decoded into the expected shape
    #[error("Invalid upstream response: {0}")]
    Decode(String),

    /// Upstream call exceeded the configured timeout
    #[error("Upstream request timed out")]
    Timeout,

    /// The inbound request could not be turned into an upstream call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl UpstreamError {
    /// HTTP status reported by the upstream, if it answered at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            UpstreamError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// Errors from the personal-account login at startup.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The auth server refused the credentials
    #[error("Login rejected: {0}")]
    Rejected(String),

    /// The login call itself failed
    #[error("Login failed: {0}")]
    Upstream(#[from] UpstreamError),
}
