use std::fmt;
use std::time::{Duration, Instant};

/// The four values identifying the single service account.
///
/// Any of them may be empty; the login then fails upstream rather than here.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AccountCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl AccountCredentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Names of the values that are empty, for startup warnings.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

// Secrets stay out of logs.
impl fmt::Debug for AccountCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session with the upstream catalog.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCredential {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<Instant>,
}

impl SessionCredential {
    /// Build a credential from a token grant.
    ///
    /// `expires_in` is the lifetime in seconds as reported by the auth server.
    /// A lifetime too large to represent is treated as no expiry.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<u64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in
                .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs))),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Whether the access token has passed its reported lifetime.
    ///
    /// Nothing renews it; once expired, upstream calls fail individually.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .map(|at| Instant::now() >= at)
            .unwrap_or(false)
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
