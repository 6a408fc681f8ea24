//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle of the demo router, with wiremock
//! standing in for the Hub.

use std::collections::HashSet;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::get,
    Json, Router,
};
use hub_auth::api::{create_router, stats_handler};
use hub_auth::auth::{HubUserAuth, MaybeHubUser};
use hub_auth::{AppState, HubAuth, HubAuthConfig};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const COOKIE_NAME: &str = "jupyter-hub-token";
const LOGIN_URL: &str = "https://hub.example.com/hub/login";

// == Helper Functions ==

fn create_test_state(server: &MockServer, hub_users: Option<&[&str]>) -> AppState {
    let config = HubAuthConfig::new("secret-token")
        .with_api_url(format!("{}/hub/api", server.uri()))
        .with_login_url(LOGIN_URL);
    let users: Option<HashSet<String>> =
        hub_users.map(|names| names.iter().map(|n| n.to_string()).collect());
    AppState::new(HubAuth::new(config).unwrap()).with_hub_users(users)
}

fn create_test_app(server: &MockServer, hub_users: Option<&[&str]>) -> Router {
    create_router(create_test_state(server, hub_users))
}

async fn get_stats(app: Router) -> Value {
    let response = app
        .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    body_to_json(response.into_body()).await
}

async fn mount_user(server: &MockServer, cookie: &str, name: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!(
            "/hub/api/authorizations/cookie/{COOKIE_NAME}/{cookie}"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": name,
            "admin": false,
        })))
        .expect(calls)
        .mount(server)
        .await;
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("{COOKIE_NAME}={cookie}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == /whoami ==

#[tokio::test]
async fn test_whoami_returns_hub_user() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "nandy", 1).await;
    let app = create_test_app(&server, None);

    let response = app.oneshot(get_with_cookie("/whoami", "abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "nandy");
    assert_eq!(json["user"]["admin"], false);
}

#[tokio::test]
async fn test_whoami_cached_across_requests() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "nandy", 1).await;
    let app = create_test_app(&server, None);

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(get_with_cookie("/whoami", "abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = get_stats(app).await;
    assert_eq!(json["hits"], 2);
    assert_eq!(json["user_hits"], 2);
    assert_eq!(json["anonymous_hits"], 0);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["total_entries"], 1);
}

#[tokio::test]
async fn test_whoami_unknown_cookie_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    let response = app
        .oneshot(get_with_cookie("/whoami?tab=files", "expired"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers()[header::LOCATION],
        format!("{LOGIN_URL}?next=%2Fwhoami%3Ftab%3Dfiles").as_str()
    );
}

#[tokio::test]
async fn test_whoami_hub_token_rejected_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    let response = app.oneshot(get_with_cookie("/whoami", "abc")).await.unwrap();

    // Never downgraded to a login redirect
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Permission failure"));
}

#[tokio::test]
async fn test_whoami_hub_outage_is_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    let response = app.oneshot(get_with_cookie("/whoami", "abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_unknown_cookie_counted_as_anonymous_hit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_with_cookie("/", "expired"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let json = get_stats(app).await;
    assert_eq!(json["anonymous_hits"], 1);
    assert_eq!(json["user_hits"], 0);
    assert_eq!(json["misses"], 1);
}

#[tokio::test]
async fn test_hub_errors_reported_in_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(get_with_cookie("/whoami", "abc"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    let json = get_stats(app).await;
    assert_eq!(json["hub_errors"], 2);
    assert_eq!(json["total_entries"], 0);
}

// == Shared lookup ==

async fn both_extractors_handler(
    MaybeHubUser(maybe): MaybeHubUser,
    HubUserAuth(user): HubUserAuth,
) -> Json<Value> {
    Json(json!({
        "optional": maybe.map(|u| u.name),
        "required": user.name,
    }))
}

#[tokio::test]
async fn test_extractors_in_one_request_share_one_lookup() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "nandy", 1).await;
    let app = Router::new()
        .route("/both", get(both_extractors_handler))
        .route("/stats", get(stats_handler))
        .with_state(create_test_state(&server, None));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/both", "abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["optional"], "nandy");
    assert_eq!(json["required"], "nandy");

    // The second extractor reused the first one's answer, not the cache
    let stats = get_stats(app).await;
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["hits"], 0);
}

// == /restricted ==

#[tokio::test]
async fn test_restricted_allows_listed_user() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "alice", 1).await;
    let app = create_test_app(&server, Some(&["alice"]));

    let response = app
        .oneshot(get_with_cookie("/restricted", "abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "alice");
}

#[tokio::test]
async fn test_restricted_rejects_unlisted_user_like_anonymous() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "bob", 1).await;
    let app = create_test_app(&server, Some(&["alice"]));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/restricted", "abc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);

    // Same user is fine on the unrestricted endpoint (served from cache)
    let response = app.oneshot(get_with_cookie("/whoami", "abc")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// == / ==

#[tokio::test]
async fn test_index_greets_user() {
    let server = MockServer::start().await;
    mount_user(&server, "abc", "nandy", 1).await;
    let app = create_test_app(&server, None);

    let response = app.oneshot(get_with_cookie("/", "abc")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["authenticated"], true);
    assert_eq!(json["message"], "Hello, nandy!");
}

#[tokio::test]
async fn test_index_without_cookie_makes_no_hub_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let app = create_test_app(&server, None);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["authenticated"], false);
}

// == /health ==

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = create_test_app(&server, None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}
