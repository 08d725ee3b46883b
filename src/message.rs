//! Building of outbound message payloads.

use crate::config::{MessageType, NotifierConfig};
use crate::core::{Alert, TemplateRenderer};
use crate::error::{NotifyError, Result};
use serde::Serialize;

/// A rendered message body plus its type tag. Built fresh per dispatch
/// attempt and discarded after the HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub content: String,
    pub msg_type: MessageType,
}

/// Renders alert batches into tagged outbound messages.
pub struct MessageBuilder {
    msg_type: MessageType,
}

impl MessageBuilder {
    pub fn new(msg_type: MessageType) -> Self {
        Self { msg_type }
    }

    /// Renders the batch through the injected template capability and
    /// tags the result with the configured message type.
    pub fn build(
        &self,
        renderer: &dyn TemplateRenderer,
        alerts: &[Alert],
    ) -> Result<OutboundMessage> {
        let content = renderer
            .render(alerts)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(OutboundMessage {
            content,
            msg_type: self.msg_type,
        })
    }
}

/// The message endpoint's JSON body.
#[derive(Serialize)]
pub(crate) struct MessagePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub touser: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toparty: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totag: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agentid: Option<i64>,
    pub msgtype: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<MessageContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<MessageContent<'a>>,
}

#[derive(Serialize)]
pub(crate) struct MessageContent<'a> {
    pub content: &'a str,
}

impl OutboundMessage {
    /// Assembles the wire payload, attaching recipients from the
    /// configuration and placing the body under the key matching the
    /// message type.
    pub(crate) fn to_payload<'a>(&'a self, config: &'a NotifierConfig) -> MessagePayload<'a> {
        let content = MessageContent {
            content: &self.content,
        };
        let (text, markdown) = match self.msg_type {
            MessageType::Text => (Some(content), None),
            MessageType::Markdown => (None, Some(content)),
        };
        MessagePayload {
            touser: config.to_user.as_deref(),
            toparty: config.to_party.as_deref(),
            totag: config.to_tag.as_deref(),
            agentid: config.agent_id,
            msgtype: self.msg_type.as_str(),
            text,
            markdown,
        }
    }
}
