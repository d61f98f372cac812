//! Memory facade used by the conversation layer.

use std::path::{Path, PathBuf};

use nyxie_core::Role;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::accountant::{DEFAULT_MAX_RETAINED_SIZE, TokenAccountant};
use crate::error::Result;
use crate::record::{Message, UserRecord};
use crate::store::RecordStore;
use crate::window::{DEFAULT_CONTEXT_BUDGET, select_window};

/// Tunables for the memory layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Directory holding one `user_<id>.json` per user
    #[serde(default = "MemoryConfig::default_dir")]
    pub dir: PathBuf,
    /// Retention cap per user, in approximate tokens
    #[serde(default = "MemoryConfig::default_max_retained_size")]
    pub max_retained_size: usize,
    /// Default context window budget, in approximate tokens
    #[serde(default = "MemoryConfig::default_context_budget")]
    pub context_budget: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            max_retained_size: Self::default_max_retained_size(),
            context_budget: Self::default_context_budget(),
        }
    }
}

impl MemoryConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("user_memories")
    }

    const fn default_max_retained_size() -> usize {
        DEFAULT_MAX_RETAINED_SIZE
    }

    const fn default_context_budget() -> usize {
        DEFAULT_CONTEXT_BUDGET
    }
}

/// Summary of one user's record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStats {
    pub messages: usize,
    pub user_messages: usize,
    pub model_messages: usize,
    pub total_size: usize,
    pub language: String,
}

/// Per-user conversational memory.
///
/// Every operation holds the user's lock from load through persistence, so
/// concurrent turns for one user cannot lose each other's updates.
#[derive(Debug)]
pub struct MemoryManager {
    store: RecordStore,
    accountant: TokenAccountant,
    context_budget: usize,
}

impl MemoryManager {
    #[must_use]
    pub fn new(config: &MemoryConfig) -> Self {
        info!(
            "MemoryManager initialized: max_retained_size={}, context_budget={}",
            config.max_retained_size, config.context_budget
        );
        Self {
            store: RecordStore::new(&config.dir),
            accountant: TokenAccountant::new(config.max_retained_size),
            context_budget: config.context_budget,
        }
    }

    /// Manager with default limits storing under `dir`.
    #[must_use]
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(&MemoryConfig {
            dir: dir.as_ref().to_path_buf(),
            ..MemoryConfig::default()
        })
    }

    #[must_use]
    pub const fn store(&self) -> &RecordStore {
        &self.store
    }

    #[must_use]
    pub const fn accountant(&self) -> &TokenAccountant {
        &self.accountant
    }

    #[must_use]
    pub const fn context_budget(&self) -> usize {
        self.context_budget
    }

    /// Append one message, evict to the retention cap, and persist.
    ///
    /// Returns the messages evicted to make room.
    pub async fn append(&self, user_id: &str, role: Role, content: String) -> Result<Vec<Message>> {
        let accountant = self.accountant;
        let mut guard = self.store.lock(user_id).await?;
        let evicted = guard
            .update(|record| accountant.append(record, role, content))
            .await?;
        debug!(
            "Appended {role} message for user {user_id} ({} retained, size {})",
            guard.len(),
            guard.total_size()
        );
        Ok(evicted)
    }

    /// Append a user message and the model's reply as one update.
    pub async fn append_exchange(
        &self,
        user_id: &str,
        user_content: String,
        reply: String,
    ) -> Result<Vec<Message>> {
        let accountant = self.accountant;
        let mut guard = self.store.lock(user_id).await?;
        let evicted = guard
            .update(|record| {
                let mut evicted = accountant.append(record, Role::User, user_content);
                evicted.extend(accountant.append(record, Role::Model, reply));
                evicted
            })
            .await?;
        if !evicted.is_empty() {
            info!(
                "Evicted {} old messages for user {user_id} to stay within {}",
                evicted.len(),
                self.accountant.max_retained_size()
            );
        }
        Ok(evicted)
    }

    /// Context window for the next request, oldest first.
    ///
    /// `budget` falls back to the configured default.
    pub async fn select_window(&self, user_id: &str, budget: Option<usize>) -> Result<Vec<Message>> {
        let budget = budget.unwrap_or(self.context_budget);
        let guard = self.store.lock(user_id).await?;
        Ok(select_window(guard.messages(), budget).to_vec())
    }

    /// Drop the oldest retained message and persist. `None` when empty.
    pub async fn evict_oldest(&self, user_id: &str) -> Result<Option<Message>> {
        let mut guard = self.store.lock(user_id).await?;
        if guard.is_empty() {
            return Ok(None);
        }
        let oldest = guard.update(|record| record.evict_front(1).pop()).await?;
        debug!("Evicted oldest message for user {user_id}");
        Ok(oldest)
    }

    pub async fn message_count(&self, user_id: &str) -> Result<usize> {
        Ok(self.store.lock(user_id).await?.len())
    }

    /// Copy of the full record.
    pub async fn snapshot(&self, user_id: &str) -> Result<UserRecord> {
        let guard = self.store.lock(user_id).await?;
        Ok(UserRecord::clone(&guard))
    }

    pub async fn stats(&self, user_id: &str) -> Result<RecordStats> {
        let guard = self.store.lock(user_id).await?;
        let user_messages = guard
            .messages()
            .iter()
            .filter(|m| m.role == Role::User)
            .count();
        Ok(RecordStats {
            messages: guard.len(),
            user_messages,
            model_messages: guard.len() - user_messages,
            total_size: guard.total_size(),
            language: guard.language().to_string(),
        })
    }

    /// Write the resident record for `user_id` through to storage.
    pub async fn persist(&self, user_id: &str) -> Result<()> {
        self.store.persist(user_id).await
    }
}
