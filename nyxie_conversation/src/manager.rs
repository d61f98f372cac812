//! Conversation manager for multi-turn dialogue.
//!
//! The `ConversationManager` is the main entry point for handling a turn
//! from any transport, with context carried across turns by memory.

use std::io::Write;
use std::sync::Arc;

use nyxie_core::{CompletionError, DEFAULT_PERSONALITY, LLMProvider, LanguageDetector};
use nyxie_memory::{MemoryError, MemoryManager, window_size};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::history::build_request;
use crate::turn::{Reply, TurnInput};

/// Configuration for conversation management.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Personality preamble sent with every message
    pub personality: String,
    /// Window budget override; memory's default when `None`
    pub context_budget: Option<usize>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            personality: DEFAULT_PERSONALITY.to_string(),
            context_budget: None,
        }
    }
}

impl ConversationConfig {
    #[must_use]
    pub fn with_personality(mut self, personality: String) -> Self {
        self.personality = personality;
        self
    }

    #[must_use]
    pub const fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = Some(budget);
        self
    }
}

/// Errors that can occur during conversation management.
///
/// Completion failures are not errors at this level; they are turned into
/// apology replies.
#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Multi-turn conversation manager shared by all users.
pub struct ConversationManager<P = Arc<dyn LLMProvider>, D = Arc<dyn LanguageDetector>>
where
    P: Send + Sync,
    D: Send + Sync,
{
    provider: P,
    detector: D,
    memory: Arc<MemoryManager>,
    config: ConversationConfig,
}

impl<P, D> ConversationManager<P, D>
where
    P: LLMProvider + Send + Sync,
    D: LanguageDetector + Send + Sync,
{
    pub fn new(provider: P, detector: D, memory: Arc<MemoryManager>, config: ConversationConfig) -> Self {
        info!(
            "Creating conversation manager (model: {})",
            provider.get_default_model()
        );
        Self {
            provider,
            detector,
            memory,
            config,
        }
    }

    #[must_use]
    pub const fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    #[must_use]
    pub const fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Process a single conversation turn for `user_id`.
    ///
    /// Returns the reply to show the user. Only memory failures are returned
    /// as errors; the caller should log them and answer with
    /// [`Reply::generic_apology`].
    pub async fn process_turn(
        &self,
        user_id: &str,
        input: TurnInput,
    ) -> Result<Reply, ConversationError> {
        if input.media.is_none() {
            let detection = self.detector.detect(&input.text);
            self.memory.record_detection(user_id, &detection).await?;
        }

        // Each token-limit retry evicts one retained message, so the
        // number of retained messages bounds the loop.
        let max_evictions = self.memory.message_count(user_id).await?;
        let mut evictions = 0;
        let mut budget = self
            .config
            .context_budget
            .unwrap_or_else(|| self.memory.context_budget());

        loop {
            let window = self.memory.select_window(user_id, Some(budget)).await?;
            let request = build_request(&self.config.personality, &window, &input);
            debug!(
                "Turn for user {user_id}: {} history messages, budget {budget}",
                window.len()
            );

            match self.provider.complete(&request).await {
                Ok(text) => {
                    self.memory
                        .append_exchange(user_id, input.history_entry(), text.clone())
                        .await?;
                    return Ok(Reply::generated(text));
                }
                Err(CompletionError::TokenLimitExceeded(reason)) => {
                    if evictions >= max_evictions {
                        warn!("Token limit still exceeded for user {user_id} with history exhausted");
                        return Ok(Reply::memory_exhausted(&input));
                    }
                    warn!("Token limit exceeded for user {user_id} ({reason}), removing oldest message");
                    if self.memory.evict_oldest(user_id).await?.is_none() {
                        return Ok(Reply::memory_exhausted(&input));
                    }
                    evictions += 1;
                    // Make sure the next window loses at least its oldest message.
                    budget = window_size(&window).saturating_sub(window.first().map_or(0, |m| m.size));
                }
                Err(e) => {
                    error!("Error generating response for user {user_id}: {e}");
                    return Ok(Reply::apology(&input));
                }
            }
        }
    }

    /// Run an interactive conversation loop on stdin/stdout as `user_id`.
    pub async fn run_interactive(&self, user_id: &str) -> Result<(), ConversationError> {
        println!("=== Nyxie: talking as {user_id} ===");
        println!("Type 'exit', 'quit', or Ctrl+C to end the session.\n");

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let mut input = String::new();
            if std::io::stdin().read_line(&mut input)? == 0 {
                break;
            }
            let input = input.trim();

            if matches!(input, "exit" | "quit" | "q") {
                break;
            }

            if input.is_empty() {
                continue;
            }

            match self.process_turn(user_id, TurnInput::text(input)).await {
                Ok(reply) => println!("\n{}\n", reply.text),
                Err(e) => {
                    error!("Turn failed for user {user_id}: {e}");
                    println!("\n{}\n", Reply::generic_apology().text);
                }
            }
        }

        let stats = self.memory.stats(user_id).await?;
        println!(
            "\nSession ended. {} messages remembered (size {}).",
            stats.messages, stats.total_size
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ConversationConfig::default();
        assert_eq!(config.personality, DEFAULT_PERSONALITY);
        assert!(config.context_budget.is_none());

        let config = config
            .with_personality("Short.".to_string())
            .with_context_budget(10);
        assert_eq!(config.personality, "Short.");
        assert_eq!(config.context_budget, Some(10));
    }
}
