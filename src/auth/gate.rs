//! Authorization gate for Hub-authenticated endpoints.
//!
//! An endpoint opts in by implementing [`HubAuthenticated`]: it supplies the
//! [`HubAuth`] client and, optionally, an allow-list of user names.
//! [`get_current_user`] then resolves the request's user once and applies the
//! endpoint's policy.
//!
//! A user rejected by policy comes back as `None`, the same as an
//! unauthenticated request, so an endpoint cannot tell the client which one
//! happened.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::warn;

use crate::auth::{HubAuth, HubUser, RequestContext};
use crate::error::Result;

// == Capability ==
/// Endpoints protected by Hub authentication.
pub trait HubAuthenticated {
    /// Client used to verify the session cookie.
    fn hub_auth(&self) -> &HubAuth;

    /// Names allowed through; `None` admits any Hub user.
    fn hub_users(&self) -> Option<&HashSet<String>> {
        None
    }

    /// Decides whether an authenticated Hub user may proceed.
    ///
    /// Returns the user if allowed, `None` otherwise. Override to check more
    /// than the allow-list.
    fn check_hub_user(&self, user: HubUser) -> Option<HubUser> {
        check_allow_list(user, self.hub_users())
    }
}

/// Applies an optional allow-list to an authenticated user.
pub fn check_allow_list(user: HubUser, allowed: Option<&HashSet<String>>) -> Option<HubUser> {
    match allowed {
        None => Some(user),
        Some(names) if names.contains(&user.name) => Some(user),
        Some(_) => {
            warn!(user = %user.name, "Not allowing Hub user");
            None
        }
    }
}

// == Current User ==
/// Returns the request's Hub user if it passes `endpoint`'s policy.
///
/// Verification failures propagate as errors; they are never turned into
/// `None`.
pub async fn get_current_user<E>(endpoint: &E, ctx: &mut RequestContext) -> Result<Option<HubUser>>
where
    E: HubAuthenticated + ?Sized,
{
    let user = endpoint.hub_auth().get_user(ctx).await?;
    Ok(user.and_then(|user| endpoint.check_hub_user(user)))
}

// == Protected Endpoint ==
/// A Hub client paired with an optional allow-list.
///
/// The ready-made [`HubAuthenticated`] implementation used by the axum
/// extractors.
#[derive(Debug, Clone)]
pub struct ProtectedEndpoint {
    hub_auth: Arc<HubAuth>,
    hub_users: Option<Arc<HashSet<String>>>,
}

impl ProtectedEndpoint {
    /// An endpoint open to any authenticated Hub user.
    pub fn new(hub_auth: Arc<HubAuth>) -> Self {
        Self {
            hub_auth,
            hub_users: None,
        }
    }

    /// Restricts the endpoint to the given user names.
    pub fn with_users<I, S>(mut self, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hub_users = Some(Arc::new(users.into_iter().map(Into::into).collect()));
        self
    }

    /// Shared handle to the Hub client.
    pub fn client(&self) -> &Arc<HubAuth> {
        &self.hub_auth
    }
}

impl HubAuthenticated for ProtectedEndpoint {
    fn hub_auth(&self) -> &HubAuth {
        &self.hub_auth
    }

    fn hub_users(&self) -> Option<&HashSet<String>> {
        self.hub_users.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HubAuthConfig;

    fn offline_client() -> Arc<HubAuth> {
        Arc::new(
            HubAuth::new(HubAuthConfig::new("token").with_api_url("http://127.0.0.1:1/hub/api"))
                .unwrap(),
        )
    }

    #[test]
    fn test_no_allow_list_passes_any_user() {
        let user = HubUser::new("bob");
        assert_eq!(check_allow_list(user.clone(), None), Some(user));
    }

    #[test]
    fn test_allow_list_filters_users() {
        let allowed: HashSet<String> = ["alice".to_string()].into_iter().collect();

        assert_eq!(
            check_allow_list(HubUser::new("alice"), Some(&allowed)),
            Some(HubUser::new("alice"))
        );
        assert_eq!(check_allow_list(HubUser::new("bob"), Some(&allowed)), None);
    }

    #[test]
    fn test_empty_allow_list_rejects_everyone() {
        let allowed = HashSet::new();
        assert_eq!(check_allow_list(HubUser::new("alice"), Some(&allowed)), None);
    }

    #[test]
    fn test_protected_endpoint_policy() {
        let open = ProtectedEndpoint::new(offline_client());
        assert!(open.hub_users().is_none());
        assert!(open.check_hub_user(HubUser::new("anyone")).is_some());

        let restricted = open.with_users(["inara", "mal"]);
        assert_eq!(restricted.hub_users().map(HashSet::len), Some(2));
        assert!(restricted.check_hub_user(HubUser::new("mal")).is_some());
        assert!(restricted.check_hub_user(HubUser::new("jayne")).is_none());
    }

    struct AdminsOnly {
        hub_auth: Arc<HubAuth>,
    }

    impl HubAuthenticated for AdminsOnly {
        fn hub_auth(&self) -> &HubAuth {
            &self.hub_auth
        }

        fn check_hub_user(&self, user: HubUser) -> Option<HubUser> {
            user.is_admin().then_some(user)
        }
    }

    #[test]
    fn test_custom_policy_override() {
        let endpoint = AdminsOnly {
            hub_auth: offline_client(),
        };
        let mut admin = HubUser::new("root");
        admin.extra.insert("admin".into(), serde_json::Value::Bool(true));

        assert!(endpoint.check_hub_user(admin).is_some());
        assert!(endpoint.check_hub_user(HubUser::new("guest")).is_none());
    }

    #[tokio::test]
    async fn test_get_current_user_without_cookie() {
        let endpoint = ProtectedEndpoint::new(offline_client()).with_users(["alice"]);
        let mut ctx = RequestContext::new();

        let user = get_current_user(&endpoint, &mut ctx).await.unwrap();
        assert!(user.is_none());
    }
}
