//! Catalog gateway layer.
//!
//! The facade never talks HTTP to the upstream catalog directly. Every route
//! goes through [`CatalogApi`], which exposes one method per gateway
//! operation and returns plain JSON values.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Route Dispatcher             │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           CatalogApi Trait              │
//! │  (manga, chapter, author, group,        │
//! │   cover, tag, list gateways)            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            MangaDexClient               │
//! │  (reqwest, bearer from the Session)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Tests substitute their own implementation of the trait.

mod client;
mod query;

pub(crate) use client::is_dot_segment;
pub use client::{MangaDexClient, DEFAULT_API_URL, DEFAULT_AUTH_URL};
pub use query::{QueryParams, QueryValue};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::session::{AccountCredentials, SessionCredential};

// =============================================================================
// Entity Types
// =============================================================================

/// A fetched chapter.
///
/// Serializes as the upstream entity unchanged; the id is kept alongside so
/// page resolution can be chained onto it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Chapter {
    #[serde(skip)]
    id: String,
    entity: Value,
}

impl Chapter {
    /// Wrap an upstream chapter entity.
    ///
    /// The id is taken from the entity's `id` field, falling back to the id
    /// that was requested.
    pub fn new(requested_id: &str, entity: Value) -> Self {
        let id = entity
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or(requested_id)
            .to_string();
        Self { id, entity }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn entity(&self) -> &Value {
        &self.entity
    }
}

/// One page of a manga's chapter feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub data: Vec<Value>,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub total: u64,
}

// =============================================================================
// CatalogApi Trait
// =============================================================================

/// Gateway operations against the upstream manga catalog.
///
/// Implementations are shared across all concurrent requests and must be
/// thread-safe. Any failure, whatever its cause, is an [`UpstreamError`].
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Log in with a personal API client and a user account.
    async fn login_personal(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<SessionCredential, UpstreamError>;

    async fn search_manga(&self, query: &QueryParams) -> Result<Value, UpstreamError>;

    async fn get_manga(&self, id: &str) -> Result<Value, UpstreamError>;

    async fn manga_feed(&self, id: &str, query: &QueryParams) -> Result<FeedPage, UpstreamError>;

    async fn get_chapter(&self, id: &str) -> Result<Chapter, UpstreamError>;

    /// Resolve the readable page image URLs of an already-fetched chapter.
    async fn chapter_pages(&self, chapter: &Chapter) -> Result<Vec<String>, UpstreamError>;

    /// Look up an author. Artists are the same upstream entity type.
    async fn get_author(&self, id: &str) -> Result<Value, UpstreamError>;

    async fn get_group(&self, id: &str) -> Result<Value, UpstreamError>;

    async fn search_covers(&self, query: &QueryParams) -> Result<Value, UpstreamError>;

    async fn get_cover(&self, id: &str) -> Result<Value, UpstreamError>;

    async fn all_tags(&self) -> Result<Value, UpstreamError>;

    async fn get_list(&self, id: &str) -> Result<Value, UpstreamError>;
}
