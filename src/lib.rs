//! # MangaDex Facade
//!
//! A thin, read-only HTTP/JSON gateway over the MangaDex catalog.
//!
//! The facade logs in once, as a single service account, when it starts.
//! After that it maps a fixed set of GET routes onto catalog lookups: manga,
//! chapter feeds, chapters and their page images, authors, scanlation
//! groups, covers, tags and lists. Every success is returned as JSON with
//! `200`; every failure is returned as `{"error": "..."}` with `500`.
//!
//! ## Architecture
//!
//! - [`catalog`] - The `CatalogApi` gateway seam and its reqwest client
//! - [`session`] - Shared session credential and the startup login
//! - [`server`] - Axum route table, dispatch and response normalization
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use mangadex_facade::{
//!     create_router, AccountCredentials, Bootstrapper, MangaDexClient, RouterConfig, Session,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Arc::new(Session::new());
//!     let client = Arc::new(MangaDexClient::with_defaults(session.clone()).unwrap());
//!     let router = create_router(client.clone(), session.clone(), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
//!     let credentials = AccountCredentials::new("client-id", "secret", "user", "pass");
//!     tokio::spawn(Bootstrapper::new(client, session, credentials).run());
//!
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use catalog::{
    CatalogApi, Chapter, FeedPage, MangaDexClient, QueryParams, QueryValue, DEFAULT_API_URL,
    DEFAULT_AUTH_URL,
};
pub use config::Config;
pub use error::{AuthError, UpstreamError};
pub use server::{
    create_router, dispatch, normalize, resolve_pages, AppState, ErrorResponse, HealthResponse,
    JsonFormat, Operation, PagesResponse, RequestContext, Route, RouterConfig, Target,
    RATE_LIMITS_MESSAGE, ROUTES,
};
pub use session::{AccountCredentials, AuthStatus, Bootstrapper, Session, SessionCredential};
