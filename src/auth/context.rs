//! Per-request authentication state.
//!
//! A [`RequestContext`] carries the cookies of one inbound request and the
//! memoized Hub user for that request. It lives exactly as long as the request
//! does; nothing in it is shared between requests.

use std::collections::HashMap;

use axum::http::{header::COOKIE, HeaderMap};

use crate::auth::HubUser;

/// Memo slot for the Hub user of a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum UserSlot {
    /// The Hub has not been consulted for this request yet
    #[default]
    Unresolved,
    /// The lookup ran; `None` means no authenticated user
    Resolved(Option<HubUser>),
}

/// Cookies and memoized identity for one inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cookies: HashMap<String, String>,
    hub_user: UserSlot,
}

impl RequestContext {
    /// Creates a context with no cookies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from the `Cookie` headers of a request.
    ///
    /// When a cookie name repeats, the first occurrence wins.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let mut cookies = HashMap::new();

        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            for (name, value) in parse_cookie_header(raw) {
                cookies.entry(name).or_insert(value);
            }
        }

        Self {
            cookies,
            hub_user: UserSlot::Unresolved,
        }
    }

    /// Adds a cookie, replacing any existing one of the same name.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Returns the value of a cookie by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Current state of the memo slot.
    pub fn hub_user(&self) -> &UserSlot {
        &self.hub_user
    }

    pub(crate) fn set_hub_user(&mut self, user: Option<HubUser>) {
        self.hub_user = UserSlot::Resolved(user);
    }
}

/// Splits a `Cookie` header value into name/value pairs.
fn parse_cookie_header(raw: &str) -> impl Iterator<Item = (String, String)> + '_ {
    raw.split(';').filter_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some((name.to_string(), value.to_string()))
    })
}
