//! Error taxonomy for the notification pipeline.
//!
//! Every variant is safe to log and to return to the embedding
//! application: constructors are required to pass any string that may
//! have touched the credential or the access token through
//! [`crate::redact::scrub`] first.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while dispatching a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notifier configuration is missing a required field or contains
    /// an invalid value.
    #[error("invalid notifier configuration: {0}")]
    Config(String),

    /// The configured secret file could not be opened or read.
    #[error("failed to read secret file {}: {source}", .path.display())]
    CredentialIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The network exchange with the token endpoint failed.
    #[error("token request failed: {0}")]
    AuthTransport(String),

    /// The token endpoint answered, but the reply carried no usable
    /// access token.
    #[error("token response invalid: {0}")]
    AuthResponse(String),

    /// Rendering the message body through the injected template failed.
    #[error("template rendering failed: {0}")]
    Template(String),

    /// The message endpoint rejected the delivery.
    #[error("message delivery failed: {0}")]
    Delivery(String),

    /// The caller's cancellation signal fired before the dispatch
    /// completed.
    #[error("notification canceled before completion")]
    Cancelled,
}

impl NotifyError {
    /// Whether the caller's own retry policy may reasonably re-attempt
    /// this notification. Configuration and credential problems need a
    /// human; transient network and endpoint failures do not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NotifyError::AuthTransport(_) | NotifyError::Delivery(_)
        )
    }
}

/// Convenience `Result` alias for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;
