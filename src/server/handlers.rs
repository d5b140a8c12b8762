//! HTTP request handlers for the catalog facade.
//!
//! Every gateway route follows the same shape: extract the path identifier
//! and/or query parameters, run exactly one [`Operation`] against the
//! catalog, and hand the outcome to the response normalizer.
//!
//! # Static Endpoints
//!
//! - `GET /health` - Liveness, independent of authentication
//! - `GET /rate-limits` - Fixed informational message, no upstream call
//! - `GET /` - HTML documentation page

use std::sync::Arc;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{Html, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::catalog::{is_dot_segment, CatalogApi, QueryParams};
use crate::error::UpstreamError;
use crate::session::Session;

use super::response::{normalize, JsonFormat};

/// Message returned by `GET /rate-limits`.
pub const RATE_LIMITS_MESSAGE: &str = "Check X-RateLimit headers on any API response";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// Holds the one catalog client and the one session every request runs
/// against. Passed to all handlers via Axum's State extractor.
pub struct AppState<C: CatalogApi> {
    /// Catalog gateways
    pub catalog: Arc<C>,

    /// The process-wide session credential
    pub session: Arc<Session>,

    /// How JSON bodies are written
    pub json_format: JsonFormat,
}

impl<C: CatalogApi> AppState<C> {
    pub fn new(catalog: Arc<C>, session: Arc<Session>) -> Self {
        Self {
            catalog,
            session,
            json_format: JsonFormat::default(),
        }
    }

    pub fn with_json_format(mut self, json_format: JsonFormat) -> Self {
        self.json_format = json_format;
        self
    }
}

impl<C: CatalogApi> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            session: Arc::clone(&self.session),
            json_format: self.json_format,
        }
    }
}

// =============================================================================
// Operations
// =============================================================================

/// Where a route takes its parameters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    None,
    Query,
    Id,
    IdAndQuery,
}

/// A catalog gateway operation reachable from a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SearchManga,
    GetManga,
    MangaFeed,
    GetChapter,
    /// Fetch the chapter, then resolve its page URLs
    ChapterPages,
    GetAuthor,
    GetGroup,
    SearchCovers,
    GetCover,
    AllTags,
    GetList,
}

impl Operation {
    /// Gateway and method name, for logs and documentation.
    pub fn name(self) -> &'static str {
        match self {
            Operation::SearchManga => "Manga.search",
            Operation::GetManga => "Manga.get",
            Operation::MangaFeed => "Manga.getFeed",
            Operation::GetChapter => "Chapter.get",
            Operation::ChapterPages => "Chapter.get + Chapter.getReadablePages",
            Operation::GetAuthor => "Author.get",
            Operation::GetGroup => "Group.get",
            Operation::SearchCovers => "Cover.search",
            Operation::GetCover => "Cover.get",
            Operation::AllTags => "Tag.getAllTags",
            Operation::GetList => "List.get",
        }
    }

    pub fn params(self) -> ParamSource {
        match self {
            Operation::SearchManga | Operation::SearchCovers => ParamSource::Query,
            Operation::MangaFeed => ParamSource::IdAndQuery,
            Operation::AllTags => ParamSource::None,
            Operation::GetManga
            | Operation::GetChapter
            | Operation::ChapterPages
            | Operation::GetAuthor
            | Operation::GetGroup
            | Operation::GetCover
            | Operation::GetList => ParamSource::Id,
        }
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Parameters of one inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Opaque resource identifier from the path
    pub id: Option<String>,

    /// Query parameters, forwarded verbatim
    pub query: QueryParams,
}

impl RequestContext {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            query: QueryParams::new(),
        }
    }

    pub fn with_query(query: QueryParams) -> Self {
        Self { id: None, query }
    }

    /// Build a context from extracted parts.
    ///
    /// A path segment that cannot be decoded is reported as an
    /// [`UpstreamError::InvalidRequest`] so it is normalized like any other
    /// failure.
    pub fn from_parts(
        path: Option<Result<Path<String>, PathRejection>>,
        raw_query: Option<String>,
    ) -> Result<Self, UpstreamError> {
        let id = match path {
            Some(Ok(Path(id))) => Some(id),
            Some(Err(rejection)) => {
                return Err(UpstreamError::InvalidRequest(rejection.body_text()))
            }
            None => None,
        };
        let query = raw_query
            .as_deref()
            .map(QueryParams::parse)
            .unwrap_or_default();
        Ok(Self { id, query })
    }

    /// The path identifier, refusing ones that would resolve to another path.
    fn id(&self) -> Result<&str, UpstreamError> {
        match self.id.as_deref() {
            Some(id) if is_dot_segment(id) => Err(UpstreamError::InvalidRequest(format!(
                "'{}' is not a valid identifier",
                id
            ))),
            Some(id) => Ok(id),
            None => Err(UpstreamError::InvalidRequest(
                "missing identifier".to_string(),
            )),
        }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Body of the chapter pages route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagesResponse {
    pub pages: Vec<String>,
}

/// Resolve a chapter's readable pages.
///
/// Two sequential stages behind one error boundary: page resolution only
/// starts once the chapter lookup has succeeded, and a failure at either
/// stage is returned as-is.
pub async fn resolve_pages<C: CatalogApi + ?Sized>(
    catalog: &C,
    chapter_id: &str,
) -> Result<PagesResponse, UpstreamError> {
    let chapter = catalog.get_chapter(chapter_id).await?;
    let pages = catalog.chapter_pages(&chapter).await?;
    Ok(PagesResponse { pages })
}

fn to_json<T: Serialize>(value: T) -> Result<Value, UpstreamError> {
    serde_json::to_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))
}

/// Run one operation against the catalog.
pub async fn dispatch<C: CatalogApi + ?Sized>(
    catalog: &C,
    operation: Operation,
    ctx: &RequestContext,
) -> Result<Value, UpstreamError> {
    match operation {
        Operation::SearchManga => catalog.search_manga(&ctx.query).await,
        Operation::GetManga => catalog.get_manga(ctx.id()?).await,
        Operation::MangaFeed => to_json(catalog.manga_feed(ctx.id()?, &ctx.query).await?),
        Operation::GetChapter => to_json(catalog.get_chapter(ctx.id()?).await?),
        Operation::ChapterPages => to_json(resolve_pages(catalog, ctx.id()?).await?),
        Operation::GetAuthor => catalog.get_author(ctx.id()?).await,
        Operation::GetGroup => catalog.get_group(ctx.id()?).await,
        Operation::SearchCovers => catalog.search_covers(&ctx.query).await,
        Operation::GetCover => catalog.get_cover(ctx.id()?).await,
        Operation::AllTags => catalog.all_tags().await,
        Operation::GetList => catalog.get_list(ctx.id()?).await,
    }
}

/// Handle one gateway route end to end.
pub async fn gateway_handler<C: CatalogApi>(
    state: AppState<C>,
    operation: Operation,
    ctx: Result<RequestContext, UpstreamError>,
) -> Response {
    let outcome = match ctx {
        Ok(ctx) => dispatch(state.catalog.as_ref(), operation, &ctx).await,
        Err(err) => Err(err),
    };

    if let Err(ref err) = outcome {
        let authenticated = state.session.is_authenticated().await;
        warn!(
            operation = operation.name(),
            upstream_status = err.upstream_status(),
            authenticated,
            "Gateway call failed: {}",
            err
        );
    }

    normalize(outcome, state.json_format)
}

// =============================================================================
// Static Handlers
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Rate limit information response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitsResponse {
    pub message: String,
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with `{"status": "ok"}`, whether or not the startup login
/// succeeded.
pub async fn health_handler<C: CatalogApi>(State(state): State<AppState<C>>) -> Response {
    state.json_format.render(
        StatusCode::OK,
        &HealthResponse {
            status: "ok".to_string(),
        },
    )
}

/// Handle rate limit info requests.
///
/// # Endpoint
///
/// `GET /rate-limits`
///
/// Makes no upstream call.
pub async fn rate_limits_handler<C: CatalogApi>(State(state): State<AppState<C>>) -> Response {
    state.json_format.render(
        StatusCode::OK,
        &RateLimitsResponse {
            message: RATE_LIMITS_MESSAGE.to_string(),
        },
    )
}

/// Serve the documentation page.
pub async fn docs_handler() -> Html<String> {
    Html(super::docs::render_index(super::routes::ROUTES))
}
