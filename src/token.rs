//! Access-token acquisition and caching.
//!
//! The token endpoint is the only place the raw API secret crosses the
//! network, as a query parameter. Transport errors from that request
//! would therefore stringify with the credential-bearing URL embedded;
//! every error leaving this module is stripped of its URL
//! (`reqwest::Error::without_url`) and scrubbed before it propagates.

use crate::error::{NotifyError, Result};
use crate::redact::{scrub, REDACTED};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tracing::debug;

/// A short-lived bearer credential for the message endpoint.
///
/// The value is opaque; `Debug` prints a redaction marker instead.
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    acquired_at: Instant,
}

impl AccessToken {
    pub(crate) fn new(value: String) -> Self {
        Self {
            value,
            acquired_at: Instant::now(),
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.value
    }

    /// How long ago this token was obtained.
    pub fn age(&self) -> Duration {
        self.acquired_at.elapsed()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({REDACTED})")
    }
}

/// Holds at most one access token, shared across concurrent dispatches
/// of the same notifier instance.
///
/// Reads of a valid cached token take the shared lock; a refresh takes
/// the exclusive lock and double-checks the slot, so two dispatches
/// racing on an empty cache trigger exactly one fetch.
#[derive(Default)]
pub struct TokenCache {
    slot: RwLock<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token, or invokes `fetch` exactly once to
    /// obtain and store a fresh one. On fetch failure the cache stays
    /// empty and the error propagates.
    pub async fn get<F, Fut>(&self, fetch: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        if let Some(token) = self.slot.read().await.as_ref() {
            debug!(token_age_secs = token.age().as_secs(), "reusing cached access token");
            return Ok(token.clone());
        }

        let mut slot = self.slot.write().await;
        // A concurrent dispatch may have refreshed while we waited.
        if let Some(token) = slot.as_ref() {
            return Ok(token.clone());
        }

        let token = fetch().await?;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Drops the cached token. The next `get` fetches a fresh one.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    errcode: Option<i64>,
    errmsg: Option<String>,
}

/// Performs the authentication exchange with the platform's token
/// endpoint.
pub struct TokenFetcher {
    token_url: Url,
    corp_id: String,
}

impl TokenFetcher {
    /// # Arguments
    /// * `api_url` - The base API endpoint (with trailing slash).
    /// * `corp_id` - The corporate identity identifier.
    pub fn new(api_url: &Url, corp_id: String) -> Result<Self> {
        let token_url = api_url
            .join("gettoken")
            .map_err(|e| NotifyError::Config(format!("invalid api_url: {e}")))?;
        Ok(Self { token_url, corp_id })
    }

    /// Exchanges the corp ID and secret for an access token.
    ///
    /// Honors `cancel` at every suspension point; a flipped signal (or a
    /// dropped sender, meaning the caller's context is gone) surfaces as
    /// [`NotifyError::Cancelled`] rather than a transport error that
    /// could carry the request URL.
    pub async fn fetch(
        &self,
        client: &reqwest::Client,
        secret: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<AccessToken> {
        let request = client
            .get(self.token_url.clone())
            .query(&[("corpid", self.corp_id.as_str()), ("corpsecret", secret)])
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(NotifyError::Cancelled),
            result = request => result.map_err(|e| {
                NotifyError::AuthTransport(scrub(&e.without_url().to_string(), &[secret]))
            })?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::AuthTransport(format!(
                "token endpoint returned HTTP {status}"
            )));
        }

        let body = tokio::select! {
            biased;
            _ = cancel.changed() => return Err(NotifyError::Cancelled),
            result = response.json::<TokenResponse>() => result.map_err(|e| {
                NotifyError::AuthResponse(scrub(&e.without_url().to_string(), &[secret]))
            })?,
        };

        if let Some(code) = body.errcode.filter(|&code| code != 0) {
            let errmsg = scrub(body.errmsg.as_deref().unwrap_or("unknown"), &[secret]);
            return Err(NotifyError::AuthResponse(format!(
                "platform error {code}: {errmsg}"
            )));
        }

        match body.access_token {
            Some(token) if !token.is_empty() => {
                debug!("obtained fresh access token");
                Ok(AccessToken::new(token))
            }
            _ => Err(NotifyError::AuthResponse(
                "response carried no access_token".to_string(),
            )),
        }
    }
}
