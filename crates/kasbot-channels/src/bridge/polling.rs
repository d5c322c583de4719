//! Long-polling event loop and Platform trait implementation.

use super::types::{BridgeEvent, EventBatch};
use super::{authorize, BridgePlatform};
use crate::qr::qr_data_url;
use async_trait::async_trait;
use kasbot_core::{
    error::KasbotError,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Platform, SessionListener},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Apply one bridge event.
///
/// Lifecycle events go to the listener synchronously so they are handled in
/// order. Returns `false` once the message receiver is gone.
pub(super) async fn handle_event(
    event: BridgeEvent,
    listener: &dyn SessionListener,
    tx: &mpsc::Sender<IncomingMessage>,
    allowed: &[String],
) -> bool {
    match event {
        BridgeEvent::Qr { code } => match qr_data_url(&code) {
            Ok(url) => {
                info!("WhatsApp QR code generated (scan to pair)");
                listener.on_qr_issued(url);
            }
            Err(e) => warn!("failed to render pairing QR: {e}"),
        },
        BridgeEvent::Ready { account } => {
            info!("WhatsApp ready as {account}");
            listener.on_ready(account);
        }
        BridgeEvent::Disconnected { reason } => {
            warn!("WhatsApp disconnected: {reason}");
            listener.on_disconnected(reason);
        }
        BridgeEvent::Message(msg) => {
            if msg.from_me {
                debug!("skipping own message in {}", msg.chat);
                return true;
            }

            let phone = msg.sender_phone().to_string();
            if !allowed.is_empty() && !allowed.contains(&phone) {
                warn!("ignoring whatsapp message from unauthorized {phone}");
                return true;
            }

            let incoming = IncomingMessage {
                id: Uuid::new_v4(),
                channel: "whatsapp".to_string(),
                sender_id: phone.clone(),
                sender_name: Some(msg.push_name.clone().unwrap_or(phone)),
                text: msg.body,
                reply_target: Some(msg.chat),
                is_group: msg.is_group,
            };

            if tx.send(incoming).await.is_err() {
                info!("whatsapp receiver dropped, stopping bridge poll");
                return false;
            }
        }
        BridgeEvent::Unknown => debug!("ignoring unknown bridge event"),
    }
    true
}

#[async_trait]
impl Platform for BridgePlatform {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn start(
        &self,
        listener: Arc<dyn SessionListener>,
    ) -> Result<mpsc::Receiver<IncomingMessage>, KasbotError> {
        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let token = self.config.token.clone();
        let allowed = self.config.allowed_users.clone();
        let timeout_secs = self.config.poll_timeout_secs;

        info!("WhatsApp bridge polling {base_url}...");

        let handle = tokio::spawn(async move {
            let mut cursor: Option<u64> = None;
            let mut backoff_secs: u64 = 1;

            loop {
                let mut req = client
                    .get(format!("{base_url}/events"))
                    .query(&[("timeout", timeout_secs)])
                    .timeout(Duration::from_secs(timeout_secs + 5));
                if let Some(after) = cursor {
                    req = req.query(&[("after", after)]);
                }

                let batch = match authorize(req, token.as_deref()).send().await {
                    Ok(resp) if resp.status().is_success() => resp.json::<EventBatch>().await,
                    Ok(resp) => {
                        error!(
                            "bridge poll returned {} (retry in {backoff_secs}s)",
                            resp.status()
                        );
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                    Err(e) => {
                        error!("bridge poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                let batch = match batch {
                    Ok(b) => b,
                    Err(e) => {
                        error!("bridge parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                // Successful poll -- reset backoff.
                backoff_secs = 1;
                if batch.next.is_some() {
                    cursor = batch.next;
                }

                for event in batch.events {
                    if !handle_event(event, listener.as_ref(), &tx, &allowed).await {
                        return;
                    }
                }
            }
        });

        *self.poll_handle.lock().await = Some(handle);
        info!("WhatsApp bridge started");
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), KasbotError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| KasbotError::Transport("no reply_target on outgoing message".into()))?;

        self.send_text(target, &message.text).await
    }

    async fn rename_group(&self, group_id: &str, subject: &str) -> Result<(), KasbotError> {
        self.set_subject(group_id, subject).await
    }

    async fn logout(&self) -> Result<(), KasbotError> {
        self.request_logout().await
    }

    async fn stop(&self) -> Result<(), KasbotError> {
        if let Some(handle) = self.poll_handle.lock().await.take() {
            handle.abort();
        }
        info!("WhatsApp bridge stopped");
        Ok(())
    }
}
