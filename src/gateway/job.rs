//! Recurring group-label job. At most one timer task is alive at a time.

use super::label::{compose_label, GroupLabelUpdater};
use kasbot_core::{config::JobConfig, error::KasbotError, traits::AmountSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

/// What `start()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

impl StartOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Started => "Cron job started.",
            Self::AlreadyRunning => "Cron job is already running.",
        }
    }
}

/// What `stop()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    NotRunning,
}

impl StopOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Stopped => "Cron job stopped.",
            Self::NotRunning => "Cron job is not running.",
        }
    }
}

/// Everything one tick needs, cloned into each tick task.
#[derive(Clone)]
struct Tick {
    source: Arc<dyn AmountSource>,
    updater: Arc<GroupLabelUpdater>,
    group_id: String,
    label_prefix: String,
}

impl Tick {
    /// Fetch the amount and rename the group. Returns the label that was set.
    async fn run(&self) -> Result<String, KasbotError> {
        let amount = self.source.fetch_latest_amount().await?;
        let label = compose_label(&amount, &self.label_prefix);
        self.updater.rename(&self.group_id, &label).await?;
        Ok(label)
    }
}

/// Idle/Running controller for the label job.
pub struct JobController {
    tick: Tick,
    interval: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl JobController {
    pub fn new(
        source: Arc<dyn AmountSource>,
        updater: Arc<GroupLabelUpdater>,
        config: &JobConfig,
    ) -> Self {
        Self {
            tick: Tick {
                source,
                updater,
                group_id: config.group_id.clone(),
                label_prefix: config.label_prefix.clone(),
            },
            interval: Duration::from_secs(config.interval_secs.max(1)),
            handle: Mutex::new(None),
        }
    }

    /// Start the timer unless one is already running.
    ///
    /// The first tick fires one interval after start. Each tick body runs in
    /// its own task, so a slow tick never delays the next one and ticks may
    /// overlap.
    pub async fn start(&self) -> StartOutcome {
        let mut handle = self.handle.lock().await;
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return StartOutcome::AlreadyRunning;
        }

        let tick = self.tick.clone();
        let period = self.interval;
        *handle = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + period, period);
            loop {
                timer.tick().await;
                let tick = tick.clone();
                tokio::spawn(async move {
                    match tick.run().await {
                        Ok(label) => info!("job: tick done, label {label}"),
                        Err(e) => warn!("job: tick from {} failed: {e}", tick.source.name()),
                    }
                });
            }
        }));

        info!(
            "job: started (every {}s, source {}, group {})",
            period.as_secs(),
            self.tick.source.name(),
            self.tick.group_id
        );
        StartOutcome::Started
    }

    /// Cancel the timer. In-flight ticks run to completion.
    pub async fn stop(&self) -> StopOutcome {
        match self.handle.lock().await.take() {
            Some(h) => {
                h.abort();
                info!("job: stopped");
                StopOutcome::Stopped
            }
            None => StopOutcome::NotRunning,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }
}
