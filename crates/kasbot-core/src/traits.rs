use crate::{
    amount::ExternalAmount,
    error::KasbotError,
    message::{IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Session lifecycle callbacks.
///
/// A platform delivers these in emission order and never runs two of them
/// concurrently. Implementations must not block.
pub trait SessionListener: Send + Sync {
    /// A new pairing QR was issued. `payload` is already encoded for display.
    fn on_qr_issued(&self, payload: String);

    /// The session is authenticated and ready to send.
    fn on_ready(&self, account_id: String);

    /// The session was lost (logout, network, unlinked device).
    fn on_disconnected(&self, reason: String);
}

/// Messaging platform client.
///
/// Connection establishment, transport and the chat object model live behind
/// this trait; kasbot only drives it.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Human-readable platform name.
    fn name(&self) -> &str;

    /// Connect, register the lifecycle listener, and start receiving messages.
    async fn start(
        &self,
        listener: Arc<dyn SessionListener>,
    ) -> Result<mpsc::Receiver<IncomingMessage>, KasbotError>;

    /// Send a text message to `message.reply_target`.
    async fn send(&self, message: OutgoingMessage) -> Result<(), KasbotError>;

    /// Change a group's subject.
    async fn rename_group(&self, group_id: &str, subject: &str) -> Result<(), KasbotError>;

    /// Log the session out. State is reset by the following disconnect event.
    async fn logout(&self) -> Result<(), KasbotError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), KasbotError>;
}

/// Source of the amount shown in the group label.
#[async_trait]
pub trait AmountSource: Send + Sync {
    /// Human-readable source name.
    fn name(&self) -> &str;

    /// Fetch and parse the latest value. Never cached.
    async fn fetch_latest_amount(&self) -> Result<ExternalAmount, KasbotError>;
}
