//! The notifier: secret-safe authenticated dispatch to the message
//! platform.
//!
//! One `WeComNotifier` instance per configured endpoint, reused across
//! many notification calls. Each call runs the same linear pipeline:
//! resolve credential, obtain token (cache or fetch), build message,
//! POST, interpret the reply. Errors leave this module only after URL
//! stripping and scrubbing; the caller-supplied cancellation signal is
//! honored at every network await.

use crate::config::NotifierConfig;
use crate::core::{Alert, TemplateRenderer};
use crate::credentials::SecretSource;
use crate::error::{NotifyError, Result};
use crate::message::MessageBuilder;
use crate::redact::{scrub, truncate, MAX_BODY_LENGTH};
use crate::token::{TokenCache, TokenFetcher};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Platform error codes meaning the access token is invalid or expired.
const TOKEN_REJECTED_CODES: [i64; 2] = [40014, 42001];

#[derive(Deserialize)]
struct DeliveryResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

/// Delivers alert notifications to a WeCom-style message platform.
pub struct WeComNotifier {
    config: NotifierConfig,
    message_url: Url,
    secret_source: SecretSource,
    fetcher: TokenFetcher,
    token_cache: TokenCache,
    builder: MessageBuilder,
    renderer: Arc<dyn TemplateRenderer>,
    client: reqwest::Client,
}

// Manual impl: `renderer` is a trait object without a `Debug` bound, so
// `#[derive(Debug)]` cannot be used.
impl std::fmt::Debug for WeComNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeComNotifier")
            .field("config", &self.config)
            .field("message_url", &self.message_url)
            .finish_non_exhaustive()
    }
}

impl WeComNotifier {
    /// Creates a notifier from a configuration and a template capability.
    ///
    /// Fails with [`NotifyError::Config`] if the configuration is
    /// invalid (unparseable endpoint, empty corp ID, zero or two secret
    /// sources).
    pub fn new(config: NotifierConfig, renderer: Arc<dyn TemplateRenderer>) -> Result<Self> {
        config.validate()?;
        let secret_source = SecretSource::from_config(&config)?;

        // Join semantics require the base to end in a slash.
        let mut base = config.api_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let api_url =
            Url::parse(&base).map_err(|e| NotifyError::Config(format!("invalid api_url: {e}")))?;
        let message_url = api_url
            .join("message/send")
            .map_err(|e| NotifyError::Config(format!("invalid api_url: {e}")))?;

        let fetcher = TokenFetcher::new(&api_url, config.corp_id.clone())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds))
            .danger_accept_invalid_certs(config.http.accept_invalid_certs)
            .build()
            .map_err(|e| NotifyError::Config(format!("failed to build HTTP client: {e}")))?;

        let builder = MessageBuilder::new(config.message_type);
        Ok(Self {
            config,
            message_url,
            secret_source,
            fetcher,
            token_cache: TokenCache::new(),
            builder,
            renderer,
            client,
        })
    }

    /// Sends one notification for a batch of alerts.
    ///
    /// `cancel` is the caller's cancellation signal: flipping it to
    /// `true` (or dropping its sender) aborts the in-flight network call
    /// and surfaces [`NotifyError::Cancelled`]. Check
    /// [`NotifyError::is_retryable`] on failure to drive the caller's
    /// own retry policy.
    #[instrument(skip(self, alerts, cancel), fields(count = alerts.len()))]
    pub async fn notify(
        &self,
        alerts: &[Alert],
        mut cancel: watch::Receiver<bool>,
    ) -> Result<()> {
        if *cancel.borrow() {
            return Err(NotifyError::Cancelled);
        }

        // Re-resolved every call so secret rotation is picked up.
        let secret = self.secret_source.resolve().await?;

        let mut retried = false;
        loop {
            let token = self
                .token_cache
                .get(|| self.fetcher.fetch(&self.client, &secret, &mut cancel))
                .await?;
            let needles = [secret.as_str(), token.as_str()];

            let message = self.builder.build(self.renderer.as_ref(), alerts)?;
            let payload = message.to_payload(&self.config);

            let request = self
                .client
                .post(self.message_url.clone())
                .bearer_auth(token.as_str())
                .json(&payload)
                .send();
            let response = tokio::select! {
                biased;
                _ = cancel.changed() => return Err(NotifyError::Cancelled),
                result = request => result.map_err(|e| {
                    NotifyError::Delivery(scrub(&e.without_url().to_string(), &needles))
                })?,
            };

            let status = response.status();
            let body = tokio::select! {
                biased;
                _ = cancel.changed() => return Err(NotifyError::Cancelled),
                result = response.text() => result.map_err(|e| {
                    NotifyError::Delivery(scrub(&e.without_url().to_string(), &needles))
                })?,
            };

            if !status.is_success() {
                return Err(NotifyError::Delivery(format!(
                    "endpoint returned HTTP {status}: {}",
                    truncate(&scrub(&body, &needles), MAX_BODY_LENGTH)
                )));
            }

            let reply: DeliveryResponse = serde_json::from_str(&body).map_err(|_| {
                NotifyError::Delivery(format!(
                    "unparseable response: {}",
                    truncate(&scrub(&body, &needles), MAX_BODY_LENGTH)
                ))
            })?;

            match reply.errcode {
                0 => {
                    info!(count = alerts.len(), "notification delivered");
                    return Ok(());
                }
                code if TOKEN_REJECTED_CODES.contains(&code) && !retried => {
                    warn!(errcode = code, "access token rejected, refreshing");
                    self.token_cache.invalidate().await;
                    retried = true;
                }
                code => {
                    debug!(errcode = code, "delivery rejected");
                    return Err(NotifyError::Delivery(format!(
                        "platform error {code}: {}",
                        scrub(&reply.errmsg, &needles)
                    )));
                }
            }
        }
    }
}
