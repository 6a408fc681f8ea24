//! Configuration Module
//!
//! Handles loading the Hub client and server configuration from environment
//! variables.

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_MAX_AGE_SECS;
use crate::error::ConfigError;

/// Default base URL of the Hub's internal API
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8081/hub/api";
/// Default public login URL of the Hub
pub const DEFAULT_LOGIN_URL: &str = "https://127.0.0.1:8000/hub/login";
/// Default name of the Hub session cookie
pub const DEFAULT_COOKIE_NAME: &str = "jupyter-hub-token";
/// Default timeout, in seconds, for one call to the Hub API
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// == Hub Auth Config ==
/// Settings for talking to the Hub API.
#[derive(Clone)]
pub struct HubAuthConfig {
    /// Base URL of the Hub's API, typically `http://hub-ip:hub-port/hub/api`
    pub api_url: String,
    /// Public login URL of the Hub, where unauthenticated users are sent
    pub login_url: String,
    /// Token sent as `Authorization: token ...` on every verification call
    pub api_token: String,
    /// Name of the session cookie to verify
    pub cookie_name: String,
    /// Seconds a Hub verdict stays cached; 0 caches forever
    pub cookie_cache_max_age: u64,
    /// Seconds to wait for the Hub before giving up
    pub request_timeout: u64,
}

impl HubAuthConfig {
    /// Creates a config with the given API token and defaults for everything else.
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Sets the Hub API base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Sets the Hub login URL.
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    /// Sets the session cookie name.
    pub fn with_cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.cookie_name = cookie_name.into();
        self
    }

    /// Sets how long Hub verdicts are cached, in seconds.
    pub fn with_cookie_cache_max_age(mut self, secs: u64) -> Self {
        self.cookie_cache_max_age = secs;
        self
    }

    /// Sets the Hub request timeout, in seconds.
    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = secs;
        self
    }

    /// Cache max age as a `Duration`.
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(self.cookie_cache_max_age)
    }

    /// Request timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Checks that the settings are usable for talking to the Hub.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.trim().is_empty() {
            return Err(ConfigError::MissingApiToken);
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        Ok(())
    }
}

impl fmt::Debug for HubAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HubAuthConfig")
            .field("api_url", &self.api_url)
            .field("login_url", &self.login_url)
            .field("api_token", &"<redacted>")
            .field("cookie_name", &self.cookie_name)
            .field("cookie_cache_max_age", &self.cookie_cache_max_age)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Default for HubAuthConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            api_token: String::new(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_cache_max_age: DEFAULT_MAX_AGE_SECS,
            request_timeout: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Hub client settings
    pub hub: HubAuthConfig,
    /// Users allowed on the restricted endpoint; `None` allows any Hub user
    pub hub_users: Option<HashSet<String>>,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `HUB_API_URL` - Hub API base URL (default: http://127.0.0.1:8081/hub/api)
    /// - `HUB_LOGIN_URL` - Hub login URL (default: https://127.0.0.1:8000/hub/login)
    /// - `HUB_API_TOKEN` - Hub API token, falling back to `JPY_API_TOKEN` (no default)
    /// - `HUB_COOKIE_NAME` - Session cookie name (default: jupyter-hub-token)
    /// - `HUB_COOKIE_CACHE_MAX_AGE` - Verdict cache lifetime in seconds (default: 300)
    /// - `HUB_REQUEST_TIMEOUT` - Hub API timeout in seconds (default: 10)
    /// - `HUB_USERS` - Comma-separated allow-list for /restricted (default: any user)
    /// - `SERVER_PORT` - HTTP server port (default: 8888)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = HubAuthConfig::default();
        let hub = HubAuthConfig {
            api_url: lookup("HUB_API_URL").unwrap_or(defaults.api_url),
            login_url: lookup("HUB_LOGIN_URL").unwrap_or(defaults.login_url),
            api_token: lookup("HUB_API_TOKEN")
                .or_else(|| lookup("JPY_API_TOKEN"))
                .unwrap_or_default(),
            cookie_name: lookup("HUB_COOKIE_NAME").unwrap_or(defaults.cookie_name),
            cookie_cache_max_age: parse_or(
                &lookup,
                "HUB_COOKIE_CACHE_MAX_AGE",
                defaults.cookie_cache_max_age,
            ),
            request_timeout: parse_or(&lookup, "HUB_REQUEST_TIMEOUT", defaults.request_timeout),
        };

        Self {
            hub,
            hub_users: lookup("HUB_USERS").and_then(|v| parse_user_list(&v)),
            server_port: parse_or(&lookup, "SERVER_PORT", 8888),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hub: HubAuthConfig::default(),
            hub_users: None,
            server_port: 8888,
        }
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Parses a comma-separated user list; an empty list means no restriction.
fn parse_user_list(raw: &str) -> Option<HashSet<String>> {
    let users: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect();

    if users.is_empty() {
        None
    } else {
        Some(users)
    }
}
