//! Test doubles shared by the binary's unit tests.

use async_trait::async_trait;
use kasbot_core::{
    amount::ExternalAmount,
    error::KasbotError,
    message::{IncomingMessage, OutgoingMessage},
    traits::{AmountSource, Platform, SessionListener},
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// A platform that records every outbound call.
#[derive(Default)]
pub(crate) struct MockPlatform {
    sent: Mutex<Vec<OutgoingMessage>>,
    renames: Mutex<Vec<(String, String)>>,
    logouts: AtomicUsize,
    inbound: Mutex<Option<mpsc::Sender<IncomingMessage>>>,
    /// When true, send/rename/logout fail like a dropped transport.
    fail: bool,
}

impl MockPlatform {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn renames(&self) -> Vec<(String, String)> {
        self.renames.lock().unwrap().clone()
    }

    pub(crate) fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &self,
        _listener: Arc<dyn SessionListener>,
    ) -> Result<mpsc::Receiver<IncomingMessage>, KasbotError> {
        let (tx, rx) = mpsc::channel(8);
        *self.inbound.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), KasbotError> {
        if self.fail {
            return Err(KasbotError::Transport("connection reset".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn rename_group(&self, group_id: &str, subject: &str) -> Result<(), KasbotError> {
        if self.fail {
            return Err(KasbotError::Transport("not an admin".to_string()));
        }
        self.renames
            .lock()
            .unwrap()
            .push((group_id.to_string(), subject.to_string()));
        Ok(())
    }

    async fn logout(&self) -> Result<(), KasbotError> {
        if self.fail {
            return Err(KasbotError::Transport("session already closed".to_string()));
        }
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), KasbotError> {
        self.inbound.lock().unwrap().take();
        Ok(())
    }
}

/// An amount source with scripted results and a configurable fetch delay.
pub(crate) struct MockSource {
    script: Mutex<VecDeque<Result<ExternalAmount, KasbotError>>>,
    fallback: ExternalAmount,
    delay: Duration,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockSource {
    /// Always answers `display` (parsed value `value`) after `delay`.
    pub(crate) fn new(value: f64, display: &str, delay: Duration) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: ExternalAmount {
                value,
                display: display.to_string(),
            },
            delay,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue results returned before falling back to the fixed amount.
    pub(crate) fn with_script(
        self,
        script: impl IntoIterator<Item = Result<ExternalAmount, KasbotError>>,
    ) -> Self {
        *self.script.lock().unwrap() = script.into_iter().collect();
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AmountSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_latest_amount(&self) -> Result<ExternalAmount, KasbotError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}
