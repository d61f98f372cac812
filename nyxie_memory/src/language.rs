//! Last known language per user.
//!
//! The tag is recorded as a preference only. Nothing here validates it.

use nyxie_core::Detection;
use tracing::{debug, info};

use crate::error::Result;
use crate::manager::MemoryManager;

/// Language assumed for users who have never been detected or set.
pub const DEFAULT_LANGUAGE: &str = "en";

impl MemoryManager {
    /// Overwrite the stored language for `user_id` and persist it.
    pub async fn set_language(&self, user_id: &str, tag: &str) -> Result<()> {
        let mut guard = self.store().lock(user_id).await?;
        guard
            .update(|record| record.set_language(tag.to_string()))
            .await?;
        info!("Language for user {user_id} set to {tag}");
        Ok(())
    }

    /// Stored language for `user_id`, or [`DEFAULT_LANGUAGE`].
    pub async fn get_language(&self, user_id: &str) -> Result<String> {
        let guard = self.store().lock(user_id).await?;
        Ok(guard.language().to_string())
    }

    /// Apply a detection result. A failed detection leaves the stored tag
    /// untouched. Returns whether anything was written.
    pub async fn record_detection(&self, user_id: &str, detection: &Detection) -> Result<bool> {
        match detection {
            Detection::Detected(tag) => {
                self.set_language(user_id, tag).await?;
                Ok(true)
            }
            Detection::NotDetected => {
                debug!("Language not detected for user {user_id}, keeping stored tag");
                Ok(false)
            }
        }
    }
}
