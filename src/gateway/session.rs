//! Connection state store: the session status as reported by the platform.

use chrono::{DateTime, Utc};
use kasbot_core::traits::SessionListener;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Where the platform session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Disconnected,
    AwaitingScan,
    Ready,
}

/// Read-only view of the session.
///
/// `account_id` and `ready_since` are `Some` exactly when `status` is `Ready`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionState {
    pub status: SessionStatus,
    pub account_id: Option<String>,
    pub ready_since: Option<DateTime<Utc>>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: SessionStatus::Disconnected,
            account_id: None,
            ready_since: None,
        }
    }
}

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    pending_qr: Option<String>,
}

/// Holds the connection state and the pending pairing QR.
///
/// Mutated only through [`SessionListener`]; every transition happens under a
/// single lock acquisition.
#[derive(Default)]
pub struct ConnectionStore {
    inner: Mutex<Inner>,
}

impl ConnectionStore {
    /// Create a store in the `Disconnected` state.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> ConnectionState {
        self.lock().state.clone()
    }

    /// The encoded QR waiting to be scanned, if any.
    pub fn pending_qr(&self) -> Option<String> {
        self.lock().pending_qr.clone()
    }
}

impl SessionListener for ConnectionStore {
    fn on_qr_issued(&self, payload: String) {
        let mut inner = self.lock();
        if inner.state.status == SessionStatus::Ready {
            warn!("ignoring QR issued while session is ready");
            return;
        }
        inner.state = ConnectionState {
            status: SessionStatus::AwaitingScan,
            account_id: None,
            ready_since: None,
        };
        inner.pending_qr = Some(payload);
        info!("session awaiting QR scan");
    }

    fn on_ready(&self, account_id: String) {
        let mut inner = self.lock();
        info!("session ready as {account_id}");
        inner.state = ConnectionState {
            status: SessionStatus::Ready,
            account_id: Some(account_id),
            ready_since: Some(Utc::now()),
        };
        inner.pending_qr = None;
    }

    fn on_disconnected(&self, reason: String) {
        let mut inner = self.lock();
        // The QR stays until the next QR event replaces it.
        inner.state = ConnectionState::default();
        info!("session disconnected: {reason}");
    }
}
