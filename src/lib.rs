//! Hub Auth - Delegated cookie authentication against a Hub API
//!
//! Verifies session cookies by asking the Hub who they belong to, caches the
//! Hub's verdicts for a bounded time, and gates axum handlers on the result.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use auth::{HubAuth, HubAuthenticated, HubUser, ProtectedEndpoint, RequestContext};
pub use config::{Config, HubAuthConfig};
pub use error::{HubAuthError, Result};
