//! Outbound bridge calls: send, group subject, logout.

use super::types::{BridgeErrorBody, SendBody, SubjectBody};
use super::BridgePlatform;
use kasbot_core::error::KasbotError;
use serde::Serialize;
use tracing::info;

impl BridgePlatform {
    /// POST a JSON body (or nothing) and map failures to `Transport` errors.
    async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<(), KasbotError> {
        let mut req = self.client.post(format!("{}{path}", self.base_url));
        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| KasbotError::Transport(format!("bridge request failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let text = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<BridgeErrorBody>(&text)
            .map(|b| b.error)
            .unwrap_or(text);
        Err(KasbotError::Transport(format!(
            "bridge {path} failed ({status}): {detail}"
        )))
    }

    /// Send a text message to a chat ID.
    pub(super) async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), KasbotError> {
        self.post("/messages", Some(&SendBody { chat_id, text }))
            .await
    }

    /// Change a group's subject.
    pub(super) async fn set_subject(
        &self,
        group_id: &str,
        subject: &str,
    ) -> Result<(), KasbotError> {
        let path = format!("/groups/{}/subject", urlencoding::encode(group_id));
        self.post(&path, Some(&SubjectBody { subject })).await?;
        info!("group {group_id} subject set to '{subject}'");
        Ok(())
    }

    /// Ask the bridge to log the session out.
    pub(super) async fn request_logout(&self) -> Result<(), KasbotError> {
        self.post::<()>("/logout", None).await
    }
}
