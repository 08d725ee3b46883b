//! Resolution of the effective API secret.
//!
//! The secret is re-resolved on every dispatch so that a rotated secret
//! file is picked up before the next token fetch. The resolved value is
//! handed to the token fetcher and nowhere else; it must never be
//! logged or embedded in an error.

use crate::config::NotifierConfig;
use crate::error::{NotifyError, Result};
use crate::redact::REDACTED;
use std::fmt;
use std::path::PathBuf;

/// Where the effective secret comes from: an inline value or a file.
#[derive(Clone)]
pub enum SecretSource {
    Inline(String),
    File(PathBuf),
}

impl SecretSource {
    /// Builds the source from a validated configuration.
    ///
    /// Fails if the configuration carries both or neither of
    /// `api_secret` and `api_secret_file`.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        match (&config.api_secret, &config.api_secret_file) {
            (Some(secret), None) => Ok(SecretSource::Inline(secret.clone())),
            (None, Some(path)) => Ok(SecretSource::File(path.clone())),
            (Some(_), Some(_)) => Err(NotifyError::Config(
                "api_secret and api_secret_file are mutually exclusive".to_string(),
            )),
            (None, None) => Err(NotifyError::Config(
                "one of api_secret or api_secret_file is required".to_string(),
            )),
        }
    }

    /// Produces the effective secret value.
    ///
    /// File contents are used verbatim, without trimming.
    pub async fn resolve(&self) -> Result<String> {
        match self {
            SecretSource::Inline(value) => Ok(value.clone()),
            SecretSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|source| {
                NotifyError::CredentialIo {
                    path: path.clone(),
                    source,
                }
            }),
        }
    }
}

// The inline value must not leak through Debug formatting.
impl fmt::Debug for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::Inline(_) => write!(f, "SecretSource::Inline({REDACTED})"),
            SecretSource::File(path) => write!(f, "SecretSource::File({})", path.display()),
        }
    }
}
