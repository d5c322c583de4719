//! Bridge wire types.

use serde::{Deserialize, Serialize};

/// `GET /events` response.
#[derive(Debug, Deserialize)]
pub(crate) struct EventBatch {
    #[serde(default)]
    pub events: Vec<BridgeEvent>,
    /// Cursor for the next poll. Absent when nothing changed.
    pub next: Option<u64>,
}

/// One session or chat event, in emission order.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum BridgeEvent {
    /// A raw pairing code (the text inside the QR).
    Qr { code: String },
    /// Authenticated. `account` is the phone number without suffix.
    Ready { account: String },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message(BridgeMessage),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BridgeMessage {
    /// Chat the message belongs to (`...@c.us` or `...@g.us`).
    pub chat: String,
    /// Sender chat ID. In groups this is the group; see `author`.
    pub from: String,
    /// Group participant who wrote the message.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub push_name: Option<String>,
}

impl BridgeMessage {
    /// Phone number of the person who wrote the message.
    pub fn sender_phone(&self) -> &str {
        let jid = self.author.as_deref().unwrap_or(&self.from);
        jid.split('@').next().unwrap_or(jid)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SendBody<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectBody<'a> {
    pub subject: &'a str,
}

/// Error body returned by the bridge on failure.
#[derive(Debug, Deserialize)]
pub(crate) struct BridgeErrorBody {
    pub error: String,
}
