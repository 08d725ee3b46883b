// src/formatting.rs

use crate::core::{Alert, AlertStatus, TemplateRenderer};

/// A plain-text renderer producing one summary line per alert.
pub struct PlainTextRenderer;

impl PlainTextRenderer {
    fn format_line(&self, alert: &Alert) -> String {
        let status = match alert.status {
            AlertStatus::Firing => "FIRING",
            AlertStatus::Resolved => "RESOLVED",
        };
        let summary = alert
            .annotations
            .get("summary")
            .map(String::as_str)
            .unwrap_or("no summary");
        match alert.starts_at {
            Some(ts) => format!("[{}] {}: {} (since {})", status, alert.name(), summary, ts.to_rfc3339()),
            None => format!("[{}] {}: {}", status, alert.name(), summary),
        }
    }
}

impl TemplateRenderer for PlainTextRenderer {
    fn render(&self, alerts: &[Alert]) -> anyhow::Result<String> {
        let lines: Vec<String> = alerts.iter().map(|alert| self.format_line(alert)).collect();
        Ok(lines.join("\n"))
    }
}

/// A renderer producing a markdown digest in the platform's quote style.
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn format_block(&self, alert: &Alert) -> String {
        let status = match alert.status {
            AlertStatus::Firing => "FIRING",
            AlertStatus::Resolved => "RESOLVED",
        };
        let mut block = format!("### [{}] {}\n", status, alert.name());
        for (key, value) in &alert.annotations {
            block.push_str(&format!("> **{}**: {}\n", key, value));
        }
        if let Some(ts) = alert.starts_at {
            block.push_str(&format!("> **since**: {}\n", ts.to_rfc3339()));
        }
        block
    }
}

impl TemplateRenderer for MarkdownRenderer {
    fn render(&self, alerts: &[Alert]) -> anyhow::Result<String> {
        let blocks: Vec<String> = alerts.iter().map(|alert| self.format_block(alert)).collect();
        Ok(blocks.join("\n"))
    }
}
