//! Axum extractors for Hub-authenticated handlers.
//!
//! # Usage
//!
//! ```ignore
//! use hub_auth::auth::{HubUserAuth, MaybeHubUser};
//!
//! // Redirects to the Hub login page if no allowed user is present
//! async fn protected(HubUserAuth(user): HubUserAuth) -> String {
//!     format!("Hello, {}!", user.name)
//! }
//!
//! // Optional authentication
//! async fn maybe(MaybeHubUser(user): MaybeHubUser) -> String {
//!     match user {
//!         Some(user) => format!("Hello, {}!", user.name),
//!         None => "Hello, guest!".to_string(),
//!     }
//! }
//! ```
//!
//! The endpoint policy comes from a [`ProtectedEndpoint`] in the request
//! extensions when a route installs one (`get(h).layer(Extension(endpoint))`),
//! otherwise from the router state via `FromRef`. The [`RequestContext`] is
//! kept in the request extensions, so every extractor in one request shares a
//! single Hub lookup.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::LOCATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};

use crate::auth::{get_current_user, HubAuthenticated, HubUser, ProtectedEndpoint, RequestContext};
use crate::error::HubAuthError;

/// Extractor that requires an allowed Hub user.
///
/// Rejects with a redirect to the Hub login page when there is none.
#[derive(Debug, Clone)]
pub struct HubUserAuth(pub HubUser);

/// Extractor for an optional Hub user.
///
/// `None` covers both "no session" and "not on the allow-list". Hub failures
/// still reject the request.
#[derive(Debug, Clone)]
pub struct MaybeHubUser(pub Option<HubUser>);

/// Why a Hub-authenticated handler did not run.
#[derive(Debug)]
pub enum HubAuthRejection {
    /// No allowed user; send the client to this login URL
    Login(String),
    /// The Hub could not give a verdict
    Failed(HubAuthError),
}

impl From<HubAuthError> for HubAuthRejection {
    fn from(err: HubAuthError) -> Self {
        Self::Failed(err)
    }
}

impl IntoResponse for HubAuthRejection {
    fn into_response(self) -> Response {
        match self {
            HubAuthRejection::Login(url) => (StatusCode::FOUND, [(LOCATION, url)]).into_response(),
            HubAuthRejection::Failed(err) => err.into_response(),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for HubUserAuth
where
    ProtectedEndpoint: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HubAuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let endpoint = endpoint_for(parts, state);

        match current_user(&endpoint, parts).await? {
            Some(user) => Ok(Self(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(HubAuthRejection::Login(
                    endpoint.hub_auth().login_redirect_url(next),
                ))
            }
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeHubUser
where
    ProtectedEndpoint: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = HubAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let endpoint = endpoint_for(parts, state);
        current_user(&endpoint, parts).await.map(Self)
    }
}

/// Route-level endpoint if one was installed, else the router-wide one.
fn endpoint_for<S>(parts: &Parts, state: &S) -> ProtectedEndpoint
where
    ProtectedEndpoint: FromRef<S>,
{
    parts
        .extensions
        .get::<ProtectedEndpoint>()
        .cloned()
        .unwrap_or_else(|| ProtectedEndpoint::from_ref(state))
}

/// Runs the gate with the request's shared context.
async fn current_user(
    endpoint: &ProtectedEndpoint,
    parts: &mut Parts,
) -> Result<Option<HubUser>, HubAuthError> {
    let mut ctx = parts
        .extensions
        .remove::<RequestContext>()
        .unwrap_or_else(|| RequestContext::from_headers(&parts.headers));

    let result = get_current_user(endpoint, &mut ctx).await;
    parts.extensions.insert(ctx);
    result
}
