//! Gateway: the main event loop connecting the platform, chat commands, the
//! label job, and the HTTP API.

pub mod auth;
pub mod job;
pub mod label;
pub mod session;

use crate::api::{self, ApiState};
use crate::commands::{self, Command};
use auth::ApiKeyGuard;
use job::JobController;
use kasbot_core::{
    config::ApiConfig,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Platform, SessionListener},
};
use session::ConnectionStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Owns the long-lived components and routes inbound messages to commands.
pub struct Gateway {
    platform: Arc<dyn Platform>,
    session: Arc<ConnectionStore>,
    jobs: Arc<JobController>,
    api_config: ApiConfig,
    guard: ApiKeyGuard,
    autostart: bool,
    uptime: Instant,
}

impl Gateway {
    /// Create a new gateway.
    pub fn new(
        platform: Arc<dyn Platform>,
        session: Arc<ConnectionStore>,
        jobs: Arc<JobController>,
        api_config: ApiConfig,
        guard: ApiKeyGuard,
        autostart: bool,
    ) -> Self {
        Self {
            platform,
            session,
            jobs,
            api_config,
            guard,
            autostart,
            uptime: Instant::now(),
        }
    }

    /// Run the main event loop until Ctrl-C or the platform stream closes.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "kasbot gateway running | platform: {} | api: {}:{}",
            self.platform.name(),
            self.api_config.host,
            self.api_config.port,
        );

        let listener: Arc<dyn SessionListener> = self.session.clone();
        let name = self.platform.name().to_string();
        let rx = self
            .platform
            .start(listener)
            .await
            .map_err(|e| anyhow::anyhow!("failed to start platform {name}: {e}"))?;
        info!("Platform started: {name}");

        // Spawn HTTP API server.
        let api_state = ApiState::new(
            self.platform.clone(),
            self.session.clone(),
            self.guard.clone(),
        );
        let api_cfg = self.api_config.clone();
        let api_handle = tokio::spawn(async move {
            api::serve(api_cfg, api_state).await;
        });

        if self.autostart {
            let outcome = self.jobs.start().await;
            info!("job autostart: {}", outcome.message());
        }

        // Main event loop with graceful shutdown.
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        };
        self.process_messages(rx, ctrl_c).await;

        self.shutdown(&api_handle).await;
        Ok(())
    }

    /// Handle inbound messages one at a time, in arrival order, until the
    /// stream closes or `shutdown` resolves.
    async fn process_messages(
        &self,
        mut rx: mpsc::Receiver<IncomingMessage>,
        shutdown: impl Future<Output = ()>,
    ) {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Some(incoming) => self.dispatch_message(incoming).await,
                    None => {
                        warn!("platform message stream closed");
                        break;
                    }
                },
                _ = &mut shutdown => break,
            }
        }
    }

    /// Map a message body to a command and reply. Unknown bodies are ignored.
    async fn dispatch_message(&self, incoming: IncomingMessage) {
        let Some(cmd) = Command::parse(&incoming.text) else {
            return;
        };
        info!(
            "command {cmd:?} from {} ({}) in {} {} chat [{}]",
            incoming.sender_name.as_deref().unwrap_or("unknown"),
            incoming.sender_id,
            incoming.channel,
            if incoming.is_group { "group" } else { "direct" },
            incoming.id,
        );

        let reply = commands::handle(cmd, &self.jobs).await;
        self.send_text(&incoming, &reply).await;
    }

    /// Graceful shutdown: stop the job, the API server, and the platform.
    async fn shutdown(&self, api_handle: &JoinHandle<()>) {
        info!("Shutting down...");

        self.jobs.stop().await;
        api_handle.abort();

        if let Err(e) = self.platform.stop().await {
            warn!("failed to stop platform {}: {e}", self.platform.name());
        }

        info!(
            "Shutdown complete after {}s.",
            self.uptime.elapsed().as_secs()
        );
    }

    /// Send a plain text message back to the chat it came from.
    async fn send_text(&self, incoming: &IncomingMessage, text: &str) {
        let msg = OutgoingMessage {
            text: text.to_string(),
            reply_target: incoming.reply_target.clone(),
        };

        if let Err(e) = self.platform.send(msg).await {
            error!("failed to send reply: {e}");
        }
    }
}
