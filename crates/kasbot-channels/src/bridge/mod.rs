//! WhatsApp Web bridge adapter.
//!
//! The bridge is a sidecar that hosts the browser-backed WhatsApp Web session
//! and persists its auth artifacts. This adapter long-polls `GET /events` for
//! lifecycle and chat events and drives the session over plain JSON posts.

mod polling;
mod send;
pub(crate) mod types;


use kasbot_core::config::BridgeConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Platform client speaking to a WhatsApp Web bridge.
pub struct BridgePlatform {
    config: BridgeConfig,
    client: reqwest::Client,
    base_url: String,
    /// Event loop task, set after `start()`.
    poll_handle: Mutex<Option<JoinHandle<()>>>,
}

impl BridgePlatform {
    /// Create a new bridge platform from config.
    pub fn new(config: BridgeConfig) -> Self {
        let base_url = config.url.trim_end_matches('/').to_string();
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            poll_handle: Mutex::new(None),
        }
    }

    /// Attach the bridge token, if configured.
    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        authorize(req, self.config.token.as_deref())
    }
}

pub(crate) fn authorize(
    req: reqwest::RequestBuilder,
    token: Option<&str>,
) -> reqwest::RequestBuilder {
    match token.filter(|t| !t.is_empty()) {
        Some(t) => req.bearer_auth(t),
        None => req,
    }
}
