//! Hub Authentication Module
//!
//! Verifies session cookies against the Hub API, caches the verdicts, and
//! gates handlers on the resulting user.

mod client;
mod context;
mod extract;
mod gate;
mod user;

pub use client::{HubAuth, VerdictStats};
pub use context::{RequestContext, UserSlot};
pub use extract::{HubAuthRejection, HubUserAuth, MaybeHubUser};
pub use gate::{check_allow_list, get_current_user, HubAuthenticated, ProtectedEndpoint};
pub use user::HubUser;
