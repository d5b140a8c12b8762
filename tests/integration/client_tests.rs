//! Upstream client tests against a local mock of the catalog API.
//!
//! Tests verify:
//! - Envelope unwrapping for entity, list and feed responses
//! - Query parameters forwarded as repeated pairs
//! - Bearer token attached once the session holds a credential
//! - Error envelopes and non-JSON failures mapped to `UpstreamError::Api`
//! - The token endpoint login form

use std::sync::Arc;
use std::time::Duration;

use mangadex_facade::{
    create_router, AccountCredentials, Bootstrapper, CatalogApi, MangaDexClient, QueryParams,
    RouterConfig, Session, UpstreamError,
};

use super::test_utils::{
    body_json, get_request, spawn_upstream, valid_credentials, UPSTREAM_TOKEN,
};

fn client_for(base: &str, session: Arc<Session>) -> MangaDexClient {
    MangaDexClient::new(
        base,
        format!("{}/token", base),
        Some(Duration::from_secs(5)),
        session,
    )
    .unwrap()
}

// =============================================================================
// Gateway Calls
// =============================================================================

#[tokio::test]
async fn test_get_manga_unwraps_data() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let manga = client.get_manga("m1").await.unwrap();
    assert_eq!(manga["id"], "m1");
    assert_eq!(manga["type"], "manga");
}

#[tokio::test]
async fn test_search_forwards_array_params() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let query = QueryParams::parse("title=one+piece&includes[]=author&includes[]=artist");
    let results = client.search_manga(&query).await.unwrap();

    let forwarded = QueryParams::parse(results[0]["query"].as_str().unwrap());
    assert_eq!(forwarded, query);
}

#[tokio::test]
async fn test_anonymous_call_has_no_bearer() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let results = client.search_manga(&QueryParams::new()).await.unwrap();
    assert!(results[0]["authorization"].is_null());
}

#[tokio::test]
async fn test_all_tags_is_not_a_manga_lookup() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let tags = client.all_tags().await.unwrap();
    assert_eq!(tags[0]["type"], "tag");
}

#[tokio::test]
async fn test_manga_feed_keeps_paging_fields() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let feed = client
        .manga_feed("m1", &QueryParams::new().with("limit", "10"))
        .await
        .unwrap();

    assert_eq!(feed.total, 1);
    assert_eq!(feed.limit, 10);
    assert_eq!(feed.data[0]["manga"], "m1");
    assert_eq!(feed.data[0]["query"], "limit=10");
}

#[tokio::test]
async fn test_chapter_pages_builds_image_urls() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let chapter = client.get_chapter("c7").await.unwrap();
    assert_eq!(chapter.id(), "c7");

    let pages = client.chapter_pages(&chapter).await.unwrap();
    assert_eq!(
        pages,
        vec![
            format!("{}/data/hash-c7/1.png", base),
            format!("{}/data/hash-c7/2.png", base),
        ]
    );
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_error_envelope_maps_to_api_error() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    match client.get_manga("missing").await {
        Err(UpstreamError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert_eq!(message, "Manga with id missing not found");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_failure_uses_status_message() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    // No such route on the mock: axum answers 404 with an empty body
    match client.get_list("l1").await {
        Err(UpstreamError::Api { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.contains("404"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_upstream_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = client_for(&base, Arc::new(Session::new()));
    let result = client.get_manga("m1").await;

    assert!(matches!(result, Err(UpstreamError::Transport(_))));
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_then_bearer_is_attached() {
    let base = spawn_upstream().await;
    let session = Arc::new(Session::new());
    let client = Arc::new(client_for(&base, session.clone()));

    Bootstrapper::new(client.clone(), session.clone(), valid_credentials())
        .authenticate()
        .await
        .unwrap();
    assert!(session.is_authenticated().await);

    let credential = session.credential().await.unwrap();
    assert_eq!(credential.access_token(), UPSTREAM_TOKEN);
    assert_eq!(credential.refresh_token(), Some("upstream-refresh-token"));

    let results = client.search_manga(&QueryParams::new()).await.unwrap();
    assert_eq!(
        results[0]["authorization"],
        format!("Bearer {}", UPSTREAM_TOKEN)
    );
}

#[tokio::test]
async fn test_login_rejected_by_token_endpoint() {
    let base = spawn_upstream().await;
    let client = client_for(&base, Arc::new(Session::new()));

    let credentials = AccountCredentials::new("personal-client", "secret", "reader", "wrong");
    match client.login_personal(&credentials).await {
        Err(UpstreamError::Api { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid user credentials");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

// =============================================================================
// End to End
// =============================================================================

#[tokio::test]
async fn test_facade_over_mock_upstream() {
    let base = spawn_upstream().await;
    let session = Arc::new(Session::new());
    let client = Arc::new(client_for(&base, session.clone()));
    let router = || {
        create_router(
            client.clone(),
            session.clone(),
            RouterConfig::new().with_tracing(false),
        )
    };

    let pages = body_json(get_request(router(), "/at-home/server/c1").await).await;
    assert_eq!(pages["pages"][0], format!("{}/data/hash-c1/1.png", base));

    let missing = get_request(router(), "/manga/missing").await;
    assert_eq!(missing.status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(missing).await["error"],
        "Manga with id missing not found"
    );
}
