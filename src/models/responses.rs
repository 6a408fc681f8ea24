//! Response DTOs for the gateway's HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::auth::{HubUser, VerdictStats};

/// Response body for the identity endpoints (GET /whoami, GET /restricted)
#[derive(Debug, Clone, Serialize)]
pub struct WhoAmIResponse {
    /// The authenticated user's name
    pub name: String,
    /// Full user model as returned by the Hub
    pub user: HubUser,
}

impl WhoAmIResponse {
    /// Creates a new WhoAmIResponse
    pub fn new(user: HubUser) -> Self {
        Self {
            name: user.name.clone(),
            user,
        }
    }
}

/// Response body for the landing endpoint (GET /)
#[derive(Debug, Clone, Serialize)]
pub struct GreetingResponse {
    /// Whether a Hub user was identified
    pub authenticated: bool,
    /// Greeting text
    pub message: String,
}

impl GreetingResponse {
    /// Creates a greeting for an optional user
    pub fn for_user(user: Option<&HubUser>) -> Self {
        match user {
            Some(user) => Self {
                authenticated: true,
                message: format!("Hello, {}!", user.name),
            },
            None => Self {
                authenticated: false,
                message: "Hello, guest!".to_string(),
            },
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Number of verdicts served from the cache
    pub hits: u64,
    /// Cached verdicts that identified a user
    pub user_hits: u64,
    /// Cached verdicts for cookies the Hub does not know
    pub anonymous_hits: u64,
    /// Number of lookups that had to ask the Hub
    pub misses: u64,
    /// Hub calls that failed without a verdict
    pub hub_errors: u64,
    /// Number of verdicts dropped for exceeding the max age
    pub expirations: u64,
    /// Current number of cached verdicts
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<VerdictStats> for StatsResponse {
    fn from(stats: VerdictStats) -> Self {
        Self {
            hit_rate: stats.cache.hit_rate(),
            hits: stats.cache.hits,
            user_hits: stats.user_hits,
            anonymous_hits: stats.anonymous_hits,
            misses: stats.cache.misses,
            hub_errors: stats.hub_errors,
            expirations: stats.cache.expirations,
            total_entries: stats.cache.total_entries,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
