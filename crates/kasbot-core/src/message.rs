use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Suffix WhatsApp uses to address an individual contact (groups use `@g.us`).
pub const CONTACT_SUFFIX: &str = "@c.us";

/// An incoming chat message from the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Platform name (e.g. "whatsapp").
    pub channel: String,
    /// Platform-specific sender ID.
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message body, verbatim.
    pub text: String,
    /// Chat the message arrived in; replies go here.
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
}

/// An outgoing message to send through the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific chat ID (e.g. `6281234567890@c.us`).
    #[serde(default)]
    pub reply_target: Option<String>,
}

impl OutgoingMessage {
    /// Build a message addressed to `target`.
    pub fn to(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: Some(target.into()),
        }
    }
}

/// Normalize a phone number to a contact chat ID.
///
/// Numbers that already carry the contact suffix pass through unchanged.
pub fn contact_chat_id(number: &str) -> String {
    if number.contains(CONTACT_SUFFIX) {
        number.to_string()
    } else {
        format!("{number}{CONTACT_SUFFIX}")
    }
}
