//! Test utilities for integration tests.
//!
//! This module provides a recording mock catalog for router-level tests and
//! an in-process mock of the upstream API for client-level tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{Path, RawQuery};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use mangadex_facade::{
    create_router, AccountCredentials, CatalogApi, Chapter, FeedPage, QueryParams, RouterConfig,
    Session, SessionCredential, UpstreamError,
};

// =============================================================================
// Mock Catalog with Call Tracking
// =============================================================================

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub id: Option<String>,
    pub query: Option<QueryParams>,
}

/// A catalog that answers from canned data and records every call.
///
/// Any method can be made to fail with [`MockCatalog::failing`].
pub struct MockCatalog {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    failures: HashMap<&'static str, UpstreamError>,
    login: Result<SessionCredential, UpstreamError>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: HashMap::new(),
            login: Ok(SessionCredential::new("mock-token", None, Some(900))),
        }
    }

    /// Make `method` fail with an upstream error carrying `message`.
    pub fn failing(mut self, method: &'static str, status: u16, message: &str) -> Self {
        self.failures.insert(
            method,
            UpstreamError::Api {
                status,
                message: message.to_string(),
            },
        );
        self
    }

    pub fn with_login(mut self, login: Result<SessionCredential, UpstreamError>) -> Self {
        self.login = login;
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    fn record(
        &self,
        method: &'static str,
        id: Option<&str>,
        query: Option<&QueryParams>,
    ) -> Result<(), UpstreamError> {
        self.calls.lock().unwrap().push(RecordedCall {
            method,
            id: id.map(str::to_string),
            query: query.cloned(),
        });
        match self.failures.get(method) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn login_personal(
        &self,
        credentials: &AccountCredentials,
    ) -> Result<SessionCredential, UpstreamError> {
        self.record("login_personal", Some(&credentials.username), None)?;
        self.login.clone()
    }

    async fn search_manga(&self, query: &QueryParams) -> Result<Value, UpstreamError> {
        self.record("search_manga", None, Some(query))?;
        Ok(json!([
            {"id": "m1", "type": "manga"},
            {"id": "m2", "type": "manga"}
        ]))
    }

    async fn get_manga(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record("get_manga", Some(id), None)?;
        Ok(json!({"id": id, "type": "manga", "attributes": {"title": {"en": "Mock"}}}))
    }

    async fn manga_feed(&self, id: &str, query: &QueryParams) -> Result<FeedPage, UpstreamError> {
        self.record("manga_feed", Some(id), Some(query))?;
        Ok(FeedPage {
            data: vec![json!({"id": "c1", "type": "chapter"})],
            limit: 10,
            offset: 0,
            total: 1,
        })
    }

    async fn get_chapter(&self, id: &str) -> Result<Chapter, UpstreamError> {
        self.record("get_chapter", Some(id), None)?;
        Ok(Chapter::new(id, json!({"id": id, "type": "chapter"})))
    }

    async fn chapter_pages(&self, chapter: &Chapter) -> Result<Vec<String>, UpstreamError> {
        self.record("chapter_pages", Some(chapter.id()), None)?;
        Ok(vec![
            format!("https://uploads.test/data/{}/1.png", chapter.id()),
            format!("https://uploads.test/data/{}/2.png", chapter.id()),
        ])
    }

    async fn get_author(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record("get_author", Some(id), None)?;
        Ok(json!({"id": id, "type": "author", "attributes": {"name": "Mock Author"}}))
    }

    async fn get_group(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record("get_group", Some(id), None)?;
        Ok(json!({"id": id, "type": "scanlation_group"}))
    }

    async fn search_covers(&self, query: &QueryParams) -> Result<Value, UpstreamError> {
        self.record("search_covers", None, Some(query))?;
        Ok(json!([{"id": "cv1", "type": "cover_art"}]))
    }

    async fn get_cover(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record("get_cover", Some(id), None)?;
        Ok(json!({"id": id, "type": "cover_art"}))
    }

    async fn all_tags(&self) -> Result<Value, UpstreamError> {
        self.record("all_tags", None, None)?;
        Ok(json!([{"id": "t1", "type": "tag"}]))
    }

    async fn get_list(&self, id: &str) -> Result<Value, UpstreamError> {
        self.record("get_list", Some(id), None)?;
        Ok(json!({"id": id, "type": "custom_list"}))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Build a router over `catalog` with an authenticated session.
pub fn test_router(catalog: Arc<MockCatalog>) -> Router {
    let session = Arc::new(Session::with_credential(SessionCredential::new(
        "mock-token",
        None,
        None,
    )));
    create_router(catalog, session, RouterConfig::new().with_tracing(false))
}

/// Send a GET request through the router.
pub async fn get_request(router: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.oneshot(request).await.unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Collect a response body as text.
pub async fn body_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}

// =============================================================================
// Mock Upstream Server
// =============================================================================

/// Access token issued by the mock token endpoint.
pub const UPSTREAM_TOKEN: &str = "upstream-access-token";

/// Password the mock token endpoint accepts.
pub const UPSTREAM_PASSWORD: &str = "correct-horse";

fn not_found(detail: String) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "result": "error",
            "errors": [{"status": 404, "title": "Not found", "detail": detail}]
        })),
    )
        .into_response()
}

fn authorization(headers: &HeaderMap) -> Value {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| Value::String(v.to_string()))
        .unwrap_or(Value::Null)
}

/// Start a mock upstream on an ephemeral local port and return its base URL.
///
/// The token endpoint is served at `{base}/token`.
pub async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let at_home_base = base.clone();

    let app = Router::new()
        .route(
            "/manga",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                Json(json!({
                    "result": "ok",
                    "data": [{
                        "query": query.unwrap_or_default(),
                        "authorization": authorization(&headers),
                    }]
                }))
            }),
        )
        .route(
            "/manga/tag",
            get(|| async { Json(json!({"result": "ok", "data": [{"id": "t1", "type": "tag"}]})) }),
        )
        .route(
            "/manga/{id}",
            get(|Path(id): Path<String>| async move {
                if id == "missing" {
                    return not_found(format!("Manga with id {} not found", id));
                }
                Json(json!({"result": "ok", "data": {"id": id, "type": "manga"}})).into_response()
            }),
        )
        .route(
            "/manga/{id}/feed",
            get(|Path(id): Path<String>, RawQuery(query): RawQuery| async move {
                Json(json!({
                    "result": "ok",
                    "data": [{"id": "c1", "manga": id, "query": query.unwrap_or_default()}],
                    "limit": 10,
                    "offset": 0,
                    "total": 1
                }))
            }),
        )
        .route(
            "/chapter/{id}",
            get(|Path(id): Path<String>| async move {
                Json(json!({"result": "ok", "data": {"id": id, "type": "chapter"}}))
            }),
        )
        .route(
            "/at-home/server/{id}",
            get(move |Path(id): Path<String>| {
                let base = at_home_base.clone();
                async move {
                    if id == "missing" {
                        return not_found(format!("Chapter with id {} not found", id));
                    }
                    Json(json!({
                        "result": "ok",
                        "baseUrl": base,
                        "chapter": {"hash": format!("hash-{}", id), "data": ["1.png", "2.png"]}
                    }))
                    .into_response()
                }
            }),
        )
        .route(
            "/author/{id}",
            get(|Path(id): Path<String>| async move {
                Json(json!({"result": "ok", "data": {"id": id, "type": "author"}}))
            }),
        )
        .route(
            "/token",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let accepted = form.get("grant_type").map(String::as_str) == Some("password")
                    && form.get("password").map(String::as_str) == Some(UPSTREAM_PASSWORD)
                    && form.get("client_id").is_some_and(|id| !id.is_empty());
                if accepted {
                    Json(json!({
                        "access_token": UPSTREAM_TOKEN,
                        "refresh_token": "upstream-refresh-token",
                        "expires_in": 900,
                        "token_type": "Bearer"
                    }))
                    .into_response()
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({
                            "error": "invalid_grant",
                            "error_description": "Invalid user credentials"
                        })),
                    )
                        .into_response()
                }
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base
}

/// Credentials the mock token endpoint accepts.
pub fn valid_credentials() -> AccountCredentials {
    AccountCredentials::new("personal-client", "client-secret", "reader", UPSTREAM_PASSWORD)
}
