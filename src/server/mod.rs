//! HTTP server layer for the MangaDex facade.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │            GET /manga/{id}, /at-home/server/{chapterId}, ...    │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────────┐  │
//! │  │  handlers   │  │  response   │  │        routes           │  │
//! │  │ (dispatch)  │  │ (normalize) │  │  (route table, CORS)    │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                        catalog::CatalogApi
//! ```

pub mod docs;
pub mod handlers;
pub mod response;
pub mod routes;

pub use handlers::{
    dispatch, docs_handler, gateway_handler, health_handler, rate_limits_handler, resolve_pages,
    AppState, HealthResponse, Operation, PagesResponse, ParamSource, RateLimitsResponse,
    RequestContext, RATE_LIMITS_MESSAGE,
};
pub use response::{normalize, ErrorResponse, JsonFormat};
pub use routes::{create_router, Route, RouterConfig, Target, ROUTES};
