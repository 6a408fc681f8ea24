//! API Routes
//!
//! Configures the Axum router with all gateway endpoints.

use axum::{routing::get, Extension, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, index_handler, restricted_handler, stats_handler, whoami_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Greets the Hub user, if any
/// - `GET /whoami` - Hub user model (login redirect when unauthenticated)
/// - `GET /restricted` - Like /whoami, limited to the configured allow-list
/// - `GET /stats` - Verdict cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let restricted = state.restricted_endpoint();

    Router::new()
        .route("/", get(index_handler))
        .route("/whoami", get(whoami_handler))
        .route(
            "/restricted",
            get(restricted_handler).layer(Extension(restricted)),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HubAuth;
    use crate::config::HubAuthConfig;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let config = HubAuthConfig::new("token")
            .with_api_url("http://127.0.0.1:1/hub/api")
            .with_login_url("https://hub.example.com/hub/login");
        create_router(AppState::new(HubAuth::new(config).unwrap()))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_whoami_without_cookie_redirects_to_login() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://hub.example.com/hub/login?next=%2Fwhoami"
        );
    }

    #[tokio::test]
    async fn test_index_without_cookie_is_guest() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unreachable_hub_is_service_unavailable() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/whoami")
                    .header(header::COOKIE, "jupyter-hub-token=abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
