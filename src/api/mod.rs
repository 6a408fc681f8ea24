//! API Module
//!
//! HTTP handlers and routing for the gateway's demo server.
//!
//! # Endpoints
//! - `GET /` - Greets the Hub user, if any
//! - `GET /whoami` - Hub user model
//! - `GET /restricted` - Hub user model, allow-listed users only
//! - `GET /stats` - Verdict cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
