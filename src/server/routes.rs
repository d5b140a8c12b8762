//! Router configuration for the catalog facade.
//!
//! Routes are declared once, in [`ROUTES`], as (method, path, target) rows.
//! The router and the documentation page are both built from that table.
//!
//! # Route Structure
//!
//! ```text
//! /                              - Documentation page (HTML)
//! /manga                         - Manga.search      (query)
//! /manga/{id}                    - Manga.get         (id)
//! /manga/{id}/feed               - Manga.getFeed     (id + query)
//! /chapter/{id}                  - Chapter.get       (id)
//! /at-home/server/{chapterId}    - Chapter.get, then getReadablePages
//! /author/{id}, /artist/{id}     - Author.get        (id)
//! /group/{id}                    - Group.get         (id)
//! /cover                         - Cover.search      (query)
//! /cover/{id}                    - Cover.get         (id)
//! /tag                           - Tag.getAllTags
//! /list/{id}                     - List.get          (id)
//! /rate-limits                   - Static message
//! /health                        - Liveness
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mangadex_facade::{create_router, MangaDexClient, RouterConfig, Session};
//!
//! let session = Arc::new(Session::new());
//! let client = Arc::new(MangaDexClient::with_defaults(session.clone())?);
//! let router = create_router(client, session, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::PathRejection, Path, RawQuery, State},
    routing::{on, MethodFilter, MethodRouter},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{
    docs_handler, gateway_handler, health_handler, rate_limits_handler, AppState, Operation,
    ParamSource, RequestContext,
};
use super::response::JsonFormat;
use crate::catalog::CatalogApi;
use crate::session::Session;

// =============================================================================
// Route Table
// =============================================================================

/// What a route does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Run a catalog operation and normalize its outcome
    Gateway(Operation),
    Health,
    RateLimits,
    Docs,
}

/// One row of the route table.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub target: Target,
    pub description: &'static str,
}

/// Every route the facade serves.
pub static ROUTES: &[Route] = &[
    Route {
        method: Method::GET,
        path: "/",
        target: Target::Docs,
        description: "This documentation page",
    },
    Route {
        method: Method::GET,
        path: "/manga",
        target: Target::Gateway(Operation::SearchManga),
        description: "Search and list manga; query parameters are forwarded as-is",
    },
    Route {
        method: Method::GET,
        path: "/manga/{id}",
        target: Target::Gateway(Operation::GetManga),
        description: "Manga details",
    },
    Route {
        method: Method::GET,
        path: "/manga/{id}/feed",
        target: Target::Gateway(Operation::MangaFeed),
        description: "Chapter feed of a manga; query parameters are forwarded as-is",
    },
    Route {
        method: Method::GET,
        path: "/chapter/{id}",
        target: Target::Gateway(Operation::GetChapter),
        description: "Single chapter info",
    },
    Route {
        method: Method::GET,
        path: "/at-home/server/{chapterId}",
        target: Target::Gateway(Operation::ChapterPages),
        description: "Readable page image URLs of a chapter, as {\"pages\": [...]}",
    },
    Route {
        method: Method::GET,
        path: "/author/{id}",
        target: Target::Gateway(Operation::GetAuthor),
        description: "Author info",
    },
    Route {
        method: Method::GET,
        path: "/artist/{id}",
        target: Target::Gateway(Operation::GetAuthor),
        description: "Artist info (same lookup as /author)",
    },
    Route {
        method: Method::GET,
        path: "/group/{id}",
        target: Target::Gateway(Operation::GetGroup),
        description: "Scanlation group info",
    },
    Route {
        method: Method::GET,
        path: "/cover",
        target: Target::Gateway(Operation::SearchCovers),
        description: "Search and filter covers; query parameters are forwarded as-is",
    },
    Route {
        method: Method::GET,
        path: "/cover/{id}",
        target: Target::Gateway(Operation::GetCover),
        description: "Cover info",
    },
    Route {
        method: Method::GET,
        path: "/tag",
        target: Target::Gateway(Operation::AllTags),
        description: "All tags",
    },
    Route {
        method: Method::GET,
        path: "/list/{id}",
        target: Target::Gateway(Operation::GetList),
        description: "Community or user-created manga list",
    },
    Route {
        method: Method::GET,
        path: "/rate-limits",
        target: Target::RateLimits,
        description: "Where to find rate limit information",
    },
    Route {
        method: Method::GET,
        path: "/health",
        target: Target::Health,
        description: "Liveness check",
    },
];

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// How JSON bodies are written
    pub json_format: JsonFormat,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Pretty JSON, tracing enabled.
    pub fn new() -> Self {
        Self {
            json_format: JsonFormat::Pretty,
            enable_tracing: true,
        }
    }

    pub fn with_json_format(mut self, json_format: JsonFormat) -> Self {
        self.json_format = json_format;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router from the route table.
///
/// The catalog and session are the only shared state; every handler gets
/// the same pair.
pub fn create_router<C>(catalog: Arc<C>, session: Arc<Session>, config: RouterConfig) -> Router
where
    C: CatalogApi + 'static,
{
    let app_state = AppState::new(catalog, session).with_json_format(config.json_format);

    let mut router = Router::<AppState<C>>::new();
    for route in ROUTES {
        let filter = match MethodFilter::try_from(route.method.clone()) {
            Ok(filter) => filter,
            Err(_) => {
                warn!(method = %route.method, path = route.path, "Skipping route with unsupported method");
                continue;
            }
        };
        router = router.route(route.path, method_router::<C>(route.target, filter));
    }

    let router = router.with_state(app_state).layer(build_cors_layer());

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn method_router<C>(target: Target, filter: MethodFilter) -> MethodRouter<AppState<C>>
where
    C: CatalogApi + 'static,
{
    match target {
        Target::Docs => on(filter, docs_handler),
        Target::Health => on(filter, health_handler::<C>),
        Target::RateLimits => on(filter, rate_limits_handler::<C>),
        Target::Gateway(operation) => gateway_method_router::<C>(operation, filter),
    }
}

/// Pick the extractors for an operation from its parameter source.
fn gateway_method_router<C>(operation: Operation, filter: MethodFilter) -> MethodRouter<AppState<C>>
where
    C: CatalogApi + 'static,
{
    match operation.params() {
        ParamSource::None => on(filter, move |State(state): State<AppState<C>>| async move {
            gateway_handler(state, operation, Ok(RequestContext::default())).await
        }),
        ParamSource::Query => on(
            filter,
            move |State(state): State<AppState<C>>, RawQuery(query): RawQuery| async move {
                let ctx = RequestContext::from_parts(None, query);
                gateway_handler(state, operation, ctx).await
            },
        ),
        ParamSource::Id => on(
            filter,
            move |State(state): State<AppState<C>>,
                  path: Result<Path<String>, PathRejection>| async move {
                let ctx = RequestContext::from_parts(Some(path), None);
                gateway_handler(state, operation, ctx).await
            },
        ),
        ParamSource::IdAndQuery => on(
            filter,
            move |State(state): State<AppState<C>>,
                  path: Result<Path<String>, PathRejection>,
                  RawQuery(query): RawQuery| async move {
                let ctx = RequestContext::from_parts(Some(path), query);
                gateway_handler(state, operation, ctx).await
            },
        ),
    }
}

/// Allow any origin on every route.
fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400))
}

// =============================================================================
// Tests
// =============================================================================
