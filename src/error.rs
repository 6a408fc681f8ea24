//! Error types for the Hub authentication gateway
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Hub Auth Error Enum ==
/// Failures while asking the Hub who owns a cookie.
///
/// None of these is a verdict about the user: they are never cached and never
/// reported as "not authenticated". A missing session (404) is `Ok(None)`.
#[derive(Error, Debug)]
pub enum HubAuthError {
    /// The Hub could not be reached, or did not answer in time
    #[error("Hub API unavailable: {0}")]
    ServiceUnavailable(String),

    /// The Hub rejected this service's own API token (403)
    #[error("Permission failure checking authorization, the API token may need replacing: {0}")]
    AuthorityPermission(String),

    /// The Hub answered with a server error (5xx)
    #[error("Failed to check authorization (upstream problem): {0}")]
    UpstreamFailure(String),

    /// The Hub rejected the request with an unexpected client error (4xx)
    #[error("Failed to check authorization: {0}")]
    AuthCheckFailure(String),

    /// The Hub answered successfully but the body is not a user record
    #[error("Malformed response from Hub: {0}")]
    MalformedResponse(String),
}

impl HubAuthError {
    /// HTTP status this failure is reported with to the client.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HubAuthError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            HubAuthError::AuthorityPermission(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HubAuthError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            HubAuthError::AuthCheckFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HubAuthError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for HubAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Config Error Enum ==
/// Problems building a Hub client from configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No API token was configured
    #[error("Missing Hub API token: set HUB_API_TOKEN or JPY_API_TOKEN")]
    MissingApiToken,

    /// A zero request timeout would fail every Hub call immediately
    #[error("Hub request timeout must be at least one second")]
    ZeroRequestTimeout,

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

// == Result Type Alias ==
/// Convenience Result type for Hub authentication.
pub type Result<T> = std::result::Result<T, HubAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            HubAuthError::ServiceUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            HubAuthError::AuthorityPermission("403".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            HubAuthError::UpstreamFailure("500".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            HubAuthError::AuthCheckFailure("400".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_into_response_has_json_error() {
        let response = HubAuthError::UpstreamFailure("[502] Bad Gateway".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().contains("upstream problem"));
    }
}
