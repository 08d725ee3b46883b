//! Configuration for the WeCom notifier.
//!
//! This module defines the `NotifierConfig` struct and its sub-structs.
//! It uses the `figment` crate to load configuration from a TOML file
//! and merge it with environment variables; embedding applications that
//! carry their own configuration layer can also construct the struct
//! directly and call [`NotifierConfig::validate`].

use crate::error::{NotifyError, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// The message type tag for the delivered payload.
///
/// Unsupported values fail at construction (deserialization or
/// [`FromStr`]), never at send time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    #[default]
    Text,
    Markdown,
}

impl MessageType {
    /// The wire name of the message type (the payload's `msgtype` field).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Markdown => "markdown",
        }
    }
}

impl FromStr for MessageType {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(MessageType::Text),
            "markdown" => Ok(MessageType::Markdown),
            other => Err(NotifyError::Config(format!(
                "unsupported message_type '{other}', expected 'text' or 'markdown'"
            ))),
        }
    }
}

/// The main configuration struct for a notifier instance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NotifierConfig {
    /// Base API endpoint, e.g. `https://qyapi.weixin.qq.com/cgi-bin/`.
    pub api_url: String,
    /// The corporate identity identifier used to authenticate.
    pub corp_id: String,
    /// The API secret, given inline. Mutually exclusive with
    /// `api_secret_file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Path to a file holding the API secret. Re-read before every token
    /// fetch, so rotation is picked up without a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret_file: Option<PathBuf>,
    /// How the delivered payload is tagged.
    #[serde(default)]
    pub message_type: MessageType,
    /// The application (agent) the message is sent as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<i64>,
    /// Target user IDs, `|`-separated per platform convention.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user: Option<String>,
    /// Target department IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_party: Option<String>,
    /// Target tag IDs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_tag: Option<String>,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Settings for the underlying HTTP client.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Whether to accept invalid TLS certificates (for testing).
    pub accept_invalid_certs: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            accept_invalid_certs: false,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_url: "https://qyapi.weixin.qq.com/cgi-bin/".to_string(),
            corp_id: String::new(),
            api_secret: None,
            api_secret_file: None,
            message_type: MessageType::default(),
            agent_id: None,
            to_user: None,
            to_party: None,
            to_tag: None,
            http: HttpConfig::default(),
        }
    }
}

impl NotifierConfig {
    /// Loads the notifier configuration from the specified file.
    ///
    /// # Arguments
    /// * `config_path` - The path to the TOML configuration file.
    pub fn load(config_path: &str) -> Result<Self> {
        let config: NotifierConfig = Figment::new()
            .merge(Serialized::defaults(NotifierConfig::default()))
            .merge(Toml::file(config_path))
            // Allow overriding with environment variables, e.g., WECOM_NOTIFY_CORP_ID=ww123
            .merge(Env::prefixed("WECOM_NOTIFY_"))
            .extract()
            .map_err(|e| NotifyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants that cannot be expressed in the type system:
    /// a parseable endpoint, a non-empty corp ID, and exactly one secret
    /// source.
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.api_url)
            .map_err(|e| NotifyError::Config(format!("invalid api_url: {e}")))?;

        if self.corp_id.is_empty() {
            return Err(NotifyError::Config("corp_id must not be empty".to_string()));
        }

        match (&self.api_secret, &self.api_secret_file) {
            (Some(_), Some(_)) => Err(NotifyError::Config(
                "api_secret and api_secret_file are mutually exclusive".to_string(),
            )),
            (None, None) => Err(NotifyError::Config(
                "one of api_secret or api_secret_file is required".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
