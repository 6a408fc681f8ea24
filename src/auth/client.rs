//! Hub API client for cookie verification.
//!
//! [`HubAuth`] forwards a session cookie to the Hub's
//! `/authorizations/cookie/{name}/{value}` endpoint and caches the answer.
//! Only definitive verdicts are cached: a user record (200) or a confirmed
//! unknown cookie (404). Transport errors and unexpected statuses are returned
//! as [`HubAuthError`] and leave the cache untouched, so a transient Hub
//! outage is retried on the next request instead of being remembered.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::{header::AUTHORIZATION, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use crate::auth::{HubUser, RequestContext, UserSlot};
use crate::cache::{CacheStats, ExpiringCache};
use crate::config::HubAuthConfig;
use crate::error::{ConfigError, HubAuthError, Result};

/// What the client has answered so far, split by kind of verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VerdictStats {
    /// Cached user records served without asking the Hub
    pub user_hits: u64,
    /// Cached "unknown cookie" verdicts served without asking the Hub
    pub anonymous_hits: u64,
    /// Hub calls that ended in an error instead of a verdict
    pub hub_errors: u64,
    /// Counters of the underlying verdict cache
    pub cache: CacheStats,
}

#[derive(Debug, Default)]
struct VerdictCounters {
    user_hits: AtomicU64,
    anonymous_hits: AtomicU64,
    hub_errors: AtomicU64,
}

/// Client for authenticating requests against the Hub.
///
/// Cheap to share behind an `Arc`; the verdict cache is internally locked.
#[derive(Debug)]
pub struct HubAuth {
    config: HubAuthConfig,
    http: reqwest::Client,
    /// Cookie value -> verdict; `None` records a cookie the Hub does not know
    cookie_cache: RwLock<ExpiringCache<Option<HubUser>>>,
    counters: VerdictCounters,
}

impl HubAuth {
    /// Creates a client from configuration.
    ///
    /// Fails if no API token is configured or the HTTP client cannot be built.
    pub fn new(config: HubAuthConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self::with_client(config, http))
    }

    /// Creates a client around an existing `reqwest::Client`.
    ///
    /// The configuration is not validated and the client's own timeout applies.
    pub fn with_client(config: HubAuthConfig, http: reqwest::Client) -> Self {
        let cookie_cache = RwLock::new(ExpiringCache::new(config.cache_max_age()));
        Self {
            config,
            http,
            cookie_cache,
            counters: VerdictCounters::default(),
        }
    }

    /// Client configuration.
    pub fn config(&self) -> &HubAuthConfig {
        &self.config
    }

    /// Name of the session cookie this client verifies.
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Public login URL of the Hub.
    pub fn login_url(&self) -> &str {
        &self.config.login_url
    }

    /// Login URL that sends the user back to `next` after logging in.
    pub fn login_redirect_url(&self, next: &str) -> String {
        let separator = if self.config.login_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!(
            "{}{}next={}",
            self.config.login_url,
            separator,
            urlencoding::encode(next)
        )
    }

    /// Verification URL for a cookie value.
    ///
    /// The value is percent-encoded as a single path segment, so `/` and other
    /// reserved characters in a cookie cannot split the path.
    pub fn cookie_url(&self, cookie_value: &str) -> String {
        format!(
            "{}/authorizations/cookie/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.cookie_name),
            urlencoding::encode(cookie_value)
        )
    }

    // == User For Cookie ==
    /// Asks the Hub which user a cookie value belongs to.
    ///
    /// Returns `Ok(Some(user))` for a valid session and `Ok(None)` when the Hub
    /// does not recognize the cookie. With `use_cache`, a cached verdict
    /// (positive or negative) is returned without contacting the Hub; without
    /// it the Hub is always asked and the cache refreshed.
    pub async fn user_for_cookie(
        &self,
        cookie_value: &str,
        use_cache: bool,
    ) -> Result<Option<HubUser>> {
        if use_cache {
            let cached = self.cookie_cache.write().await.get(cookie_value);
            if let Some(verdict) = cached {
                let counter = match verdict {
                    Some(_) => &self.counters.user_hits,
                    None => &self.counters.anonymous_hits,
                };
                counter.fetch_add(1, Ordering::Relaxed);
                debug!(
                    authenticated = verdict.is_some(),
                    "Hub cookie verdict served from cache"
                );
                return Ok(verdict);
            }
        }

        let verdict = match self.fetch_verdict(cookie_value).await {
            Ok(verdict) => verdict,
            Err(err) => {
                self.counters.hub_errors.fetch_add(1, Ordering::Relaxed);
                return Err(err);
            }
        };

        // Only reached once the response has been fully read and decoded
        self.cookie_cache
            .write()
            .await
            .set(cookie_value, verdict.clone());
        debug!(
            authenticated = verdict.is_some(),
            "Hub cookie verdict cached"
        );

        Ok(verdict)
    }

    // == Get User ==
    /// Resolves the Hub user for one request, at most once per request.
    ///
    /// Reads the session cookie from `ctx`; a missing or empty cookie yields
    /// `None` without contacting the Hub. The slot is marked resolved before
    /// the Hub is asked, so if verification fails the error is returned once
    /// and later calls for the same request see `None` rather than retrying.
    pub async fn get_user(&self, ctx: &mut RequestContext) -> Result<Option<HubUser>> {
        if let UserSlot::Resolved(user) = ctx.hub_user() {
            return Ok(user.clone());
        }
        ctx.set_hub_user(None);

        let cookie_value = match ctx.cookie(&self.config.cookie_name) {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => {
                debug!(cookie = %self.config.cookie_name, "No Hub cookie on request");
                return Ok(None);
            }
        };

        let user = self.user_for_cookie(&cookie_value, true).await?;
        ctx.set_hub_user(user.clone());
        Ok(user)
    }

    // == Cache Management ==
    /// Returns statistics for the verdict cache.
    pub async fn cache_stats(&self) -> CacheStats {
        self.cookie_cache.read().await.stats()
    }

    /// Returns verdict counters together with the cache statistics.
    pub async fn verdict_stats(&self) -> VerdictStats {
        VerdictStats {
            user_hits: self.counters.user_hits.load(Ordering::Relaxed),
            anonymous_hits: self.counters.anonymous_hits.load(Ordering::Relaxed),
            hub_errors: self.counters.hub_errors.load(Ordering::Relaxed),
            cache: self.cache_stats().await,
        }
    }

    /// Forgets the cached verdict for one cookie value.
    pub async fn invalidate(&self, cookie_value: &str) {
        self.cookie_cache.write().await.remove(cookie_value);
    }

    /// Forgets every cached verdict.
    pub async fn clear_cache(&self) {
        self.cookie_cache.write().await.clear();
    }

    async fn fetch_verdict(&self, cookie_value: &str) -> Result<Option<HubUser>> {
        let response = self
            .http
            .get(self.cookie_url(cookie_value))
            .header(AUTHORIZATION, format!("token {}", self.config.api_token))
            .send()
            .await
            .map_err(|e| self.unavailable(&e))?;

        self.read_verdict(response).await
    }

    /// Maps a Hub response to a verdict or an error.
    async fn read_verdict(&self, response: reqwest::Response) -> Result<Option<HubUser>> {
        let status = response.status();
        let summary = status_summary(status);

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::FORBIDDEN => {
                error!(
                    status = status.as_u16(),
                    "No permission to verify cookies, the Hub API token may have expired: {}",
                    summary
                );
                Err(HubAuthError::AuthorityPermission(summary))
            }
            s if s.is_server_error() => {
                error!(
                    status = s.as_u16(),
                    "Upstream failure verifying Hub cookie: {}", summary
                );
                Err(HubAuthError::UpstreamFailure(summary))
            }
            s if s.is_client_error() => {
                warn!(
                    status = s.as_u16(),
                    "Failed to check authorization with Hub: {}", summary
                );
                Err(HubAuthError::AuthCheckFailure(summary))
            }
            _ => {
                let body = response.bytes().await.map_err(|e| self.unavailable(&e))?;
                decode_user(&body).map(Some).map_err(|e| {
                    error!(status = status.as_u16(), "Undecodable Hub user model: {}", e);
                    e
                })
            }
        }
    }

    /// Builds the error for a request that never got a usable response.
    fn unavailable(&self, err: &reqwest::Error) -> HubAuthError {
        let api_url = &self.config.api_url;
        let mut msg = if err.is_timeout() {
            format!("Timed out waiting for Hub API at {api_url:?}.")
        } else {
            format!(
                "Failed to connect to Hub API at {api_url:?}. \
                 Is the Hub accessible at this URL (from host: {})?",
                local_hostname()
            )
        };
        if api_url.contains("127.0.0.1") {
            msg.push_str(
                " If this service runs on a different host than the Hub, \
                 make sure the Hub listens on an address reachable from here.",
            );
        }

        error!(error = %err, "{}", msg);
        HubAuthError::ServiceUnavailable(msg)
    }
}

/// Name of this host for diagnostics, or `"unknown"`.
fn local_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown".to_string())
}

/// `[code] reason` text for log lines and error messages.
fn status_summary(status: StatusCode) -> String {
    format!(
        "[{}] {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

fn decode_user(body: &[u8]) -> Result<HubUser> {
    let user: HubUser = serde_json::from_slice(body)
        .map_err(|e| HubAuthError::MalformedResponse(e.to_string()))?;

    if user.name.is_empty() {
        return Err(HubAuthError::MalformedResponse(
            "user model has an empty name".to_string(),
        ));
    }
    Ok(user)
}
