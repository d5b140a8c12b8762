//! Session credential and startup authentication.
//!
//! The facade authenticates exactly once, as a single service account, right
//! after the HTTP listener is bound. The resulting credential lives in a
//! [`Session`] that is shared (behind an `Arc`) by the catalog client, so
//! every upstream call made afterwards carries the same identity.
//!
//! Authentication fails open: a failed login is recorded and logged, but the
//! server keeps accepting requests. Those requests then fail one by one when
//! the upstream rejects them.

mod credential;

pub use credential::{AccountCredentials, SessionCredential};

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::catalog::CatalogApi;
use crate::error::{AuthError, UpstreamError};

// =============================================================================
// Session
// =============================================================================

/// Outcome of the startup login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    /// Login has not completed yet
    Pending,
    /// A credential is held
    Authenticated,
    /// Login failed with the given message
    Failed(String),
}

#[derive(Debug)]
struct SessionState {
    credential: Option<SessionCredential>,
    status: AuthStatus,
}

/// The process-wide session slot.
///
/// Written once by the [`Bootstrapper`], read by every upstream call.
#[derive(Debug)]
pub struct Session {
    state: RwLock<SessionState>,
}

impl Session {
    /// Create an empty, not yet authenticated session.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                credential: None,
                status: AuthStatus::Pending,
            }),
        }
    }

    /// Create a session that already holds a credential.
    pub fn with_credential(credential: SessionCredential) -> Self {
        Self {
            state: RwLock::new(SessionState {
                credential: Some(credential),
                status: AuthStatus::Authenticated,
            }),
        }
    }

    pub async fn status(&self) -> AuthStatus {
        self.state.read().await.status.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.status == AuthStatus::Authenticated
    }

    /// The held credential, if login succeeded.
    pub async fn credential(&self) -> Option<SessionCredential> {
        self.state.read().await.credential.clone()
    }

    /// The bearer token to attach to upstream calls.
    pub async fn access_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .credential
            .as_ref()
            .map(|c| c.access_token().to_string())
    }

    async fn establish(&self, credential: SessionCredential) {
        let mut state = self.state.write().await;
        state.credential = Some(credential);
        state.status = AuthStatus::Authenticated;
    }

    async fn mark_failed(&self, message: String) {
        let mut state = self.state.write().await;
        state.credential = None;
        state.status = AuthStatus::Failed(message);
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Bootstrapper
// =============================================================================

/// Performs the one-time personal-account login.
pub struct Bootstrapper<C: CatalogApi> {
    catalog: Arc<C>,
    session: Arc<Session>,
    credentials: AccountCredentials,
}

impl<C: CatalogApi> Bootstrapper<C> {
    pub fn new(catalog: Arc<C>, session: Arc<Session>, credentials: AccountCredentials) -> Self {
        Self {
            catalog,
            session,
            credentials,
        }
    }

    /// Log in and record the outcome in the session.
    ///
    /// 400/401/403 answers from the auth server are reported as
    /// [`AuthError::Rejected`]; anything else as [`AuthError::Upstream`].
    pub async fn authenticate(&self) -> Result<(), AuthError> {
        debug!(username = %self.credentials.username, "Logging in to the catalog");

        match self.catalog.login_personal(&self.credentials).await {
            Ok(credential) => {
                self.session.establish(credential).await;
                Ok(())
            }
            Err(err) => {
                let auth_err = match err {
                    UpstreamError::Api {
                        status: 400 | 401 | 403,
                        message,
                    } => AuthError::Rejected(message),
                    other => AuthError::Upstream(other),
                };
                self.session.mark_failed(auth_err.to_string()).await;
                Err(auth_err)
            }
        }
    }

    /// Authenticate once, logging the outcome and swallowing any failure.
    pub async fn run(self) {
        match self.authenticate().await {
            Ok(()) => info!("Authenticated with MangaDex"),
            Err(e) => error!(error = %e, "Authentication failed"),
        }
    }
}
