//! Bot Framework activity schema (subset the bot reads and writes).
//!
//! Inbound activities are decoded per request and dropped afterwards; outbound activities are
//! built from a [`Reply`] addressed back to the sender.

use serde::{Deserialize, Serialize};

/// Kind of activity. Anything the bot does not act on decodes as `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    ConversationUpdate,
    Typing,
    #[serde(other)]
    Other,
}

/// Sender or recipient of an activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

/// Inbound `deliveryMode` value asking for replies in the HTTP response instead of via the connector.
pub const DELIVERY_MODE_EXPECT_REPLIES: &str = "expectReplies";

/// One conversational event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub typ: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_format: Option<String>,
    #[serde(default)]
    pub from: ChannelAccount,
    #[serde(default)]
    pub recipient: ChannelAccount,
    #[serde(default)]
    pub conversation: ConversationAccount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl Activity {
    /// Text content, or "" when absent.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// True when the sender wants replies returned synchronously.
    pub fn expects_replies(&self) -> bool {
        self.delivery_mode.as_deref() == Some(DELIVERY_MODE_EXPECT_REPLIES)
    }

    /// Build an outbound activity addressed back to the sender of `self`.
    pub fn create_reply(&self, reply: &Reply) -> Activity {
        let (typ, text, text_format) = match reply {
            Reply::Typing => (ActivityType::Typing, None, None),
            Reply::Text(t) => (
                ActivityType::Message,
                Some(t.clone()),
                Some("markdown".to_string()),
            ),
        };
        Activity {
            typ,
            id: None,
            text,
            text_format,
            from: self.recipient.clone(),
            recipient: self.from.clone(),
            conversation: self.conversation.clone(),
            channel_id: self.channel_id.clone(),
            service_url: self.service_url.clone(),
            members_added: Vec::new(),
            reply_to_id: self.id.clone(),
            delivery_mode: None,
            locale: self.locale.clone(),
        }
    }
}

/// What the bot wants to say in a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Typing,
    Text(String),
}

impl Reply {
    pub fn text(s: impl Into<String>) -> Self {
        Reply::Text(s.into())
    }
}

/// Synchronous reply payload returned in the webhook HTTP response.
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeResponse {
    pub status: u16,
    pub body: serde_json::Value,
}
