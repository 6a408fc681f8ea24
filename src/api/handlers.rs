//! API Handlers
//!
//! HTTP request handlers for each gateway endpoint.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{extract::FromRef, extract::State, Json};

use crate::auth::{HubAuth, HubUserAuth, MaybeHubUser, ProtectedEndpoint};
use crate::config::Config;
use crate::error::ConfigError;
use crate::models::{GreetingResponse, HealthResponse, StatsResponse, WhoAmIResponse};

/// Application state shared across all handlers.
///
/// Holds the Hub client and the allow-list for the restricted endpoint.
#[derive(Clone)]
pub struct AppState {
    /// Shared Hub client with its verdict cache
    pub hub_auth: Arc<HubAuth>,
    /// Users allowed on /restricted; `None` admits any Hub user
    pub hub_users: Option<HashSet<String>>,
}

impl AppState {
    /// Creates a new AppState around a Hub client.
    pub fn new(hub_auth: HubAuth) -> Self {
        Self {
            hub_auth: Arc::new(hub_auth),
            hub_users: None,
        }
    }

    /// Sets the allow-list for the restricted endpoint.
    pub fn with_hub_users(mut self, hub_users: Option<HashSet<String>>) -> Self {
        self.hub_users = hub_users;
        self
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the Hub client with parameters from the Config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let hub_auth = HubAuth::new(config.hub.clone())?;
        Ok(Self::new(hub_auth).with_hub_users(config.hub_users.clone()))
    }

    /// Endpoint policy for /restricted.
    pub fn restricted_endpoint(&self) -> ProtectedEndpoint {
        let endpoint = ProtectedEndpoint::new(self.hub_auth.clone());
        match &self.hub_users {
            Some(users) => endpoint.with_users(users.iter().cloned()),
            None => endpoint,
        }
    }
}

/// Router-wide policy: any authenticated Hub user.
impl FromRef<AppState> for ProtectedEndpoint {
    fn from_ref(state: &AppState) -> Self {
        ProtectedEndpoint::new(state.hub_auth.clone())
    }
}

/// Handler for GET /
///
/// Greets the Hub user if there is one.
pub async fn index_handler(MaybeHubUser(user): MaybeHubUser) -> Json<GreetingResponse> {
    Json(GreetingResponse::for_user(user.as_ref()))
}

/// Handler for GET /whoami
///
/// Returns the Hub user model; unauthenticated requests are sent to login.
pub async fn whoami_handler(HubUserAuth(user): HubUserAuth) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::new(user))
}

/// Handler for GET /restricted
///
/// Same as /whoami but only for users on the configured allow-list.
pub async fn restricted_handler(HubUserAuth(user): HubUserAuth) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse::new(user))
}

/// Handler for GET /stats
///
/// Returns verdict and cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.hub_auth.verdict_stats().await))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
