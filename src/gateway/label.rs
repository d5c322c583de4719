//! Group label updates driven by the scheduled job.

use kasbot_core::{amount::ExternalAmount, error::KasbotError, traits::Platform};
use std::sync::Arc;
use tracing::{info, warn};

/// Build the group subject for an amount: `"{marker} {prefix}{display}"`.
pub fn compose_label(amount: &ExternalAmount, prefix: &str) -> String {
    format!("{} {prefix}{}", amount.balance().marker(), amount.display)
}

/// Renames groups through the platform.
pub struct GroupLabelUpdater {
    platform: Arc<dyn Platform>,
}

impl GroupLabelUpdater {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    /// Set the subject of `group_id`. No retry on failure.
    pub async fn rename(&self, group_id: &str, label: &str) -> Result<(), KasbotError> {
        match self.platform.rename_group(group_id, label).await {
            Ok(()) => {
                info!("label: {group_id} -> {label}");
                Ok(())
            }
            Err(e) => {
                warn!("label: rename of {group_id} failed: {e}");
                Err(KasbotError::Rename(e.to_string()))
            }
        }
    }
}
