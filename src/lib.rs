//! wecom-notify - secret-safe alert delivery to WeChat Work (WeCom)
//!
//! This library implements the outbound notification adapter for a
//! WeCom-style enterprise messaging platform: it exchanges a corporate
//! identity and API secret for a short-lived access token, caches the
//! token across calls, and posts rendered alert messages. The credential
//! and the token never appear in logs, errors, or returned URLs, even
//! when a call is canceled mid-flight.

pub mod config;
pub mod core;
pub mod credentials;
pub mod error;
pub mod formatting;
pub mod message;
pub mod notifier;
pub mod redact;
pub mod token;

// Re-export the construction-and-dispatch surface for convenience
pub use config::{HttpConfig, MessageType, NotifierConfig};
pub use core::{Alert, AlertStatus, TemplateRenderer};
pub use error::{NotifyError, Result};
pub use notifier::WeComNotifier;
