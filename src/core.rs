//! Core domain types and service traits for the notifier.
//!
//! This module defines the alert data handed in by the embedding
//! alerting system and the trait contract for the injected template
//! capability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether an alert is currently firing or has resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    #[default]
    Firing,
    Resolved,
}

/// A single alert as delivered by the upstream grouping/routing system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Alert {
    pub status: AlertStatus,
    /// Identifying label set; `alertname` is the conventional key.
    pub labels: BTreeMap<String, String>,
    /// Free-form annotations (summary, description, runbook links).
    pub annotations: BTreeMap<String, String>,
    /// When the alert started firing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Creates a minimal firing alert with only an `alertname` label.
    pub fn firing(name: &str) -> Self {
        let mut labels = BTreeMap::new();
        labels.insert("alertname".to_string(), name.to_string());
        Self {
            labels,
            ..Default::default()
        }
    }

    /// The alert's name, or `"unnamed"` if the label is absent.
    pub fn name(&self) -> &str {
        self.labels
            .get("alertname")
            .map(String::as_str)
            .unwrap_or("unnamed")
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Renders a batch of alerts into a message body.
///
/// The template syntax is owned by the embedding application; this crate
/// only tags the rendered text with the configured message type.
pub trait TemplateRenderer: Send + Sync {
    /// Produces the message body for a batch of alerts.
    ///
    /// # Returns
    /// * `Ok(String)` with the rendered body
    /// * `Err` if the template could not be evaluated
    fn render(&self, alerts: &[Alert]) -> anyhow::Result<String>;
}
