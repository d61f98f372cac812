//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use nyxie_config::Config;
use nyxie_conversation::{ConversationConfig, ConversationManager};
use nyxie_core::{LLMProvider, LanguageDetector};
use nyxie_memory::MemoryManager;
use nyxie_providers::{GeminiProvider, ScriptDetector};
use std::sync::Arc;
use tracing::info;

mod chat;
mod info;
mod init;
mod memory;
mod telegram;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use memory::{MemoryInput, MemoryStrategy};
pub use telegram::{TelegramInput, TelegramStrategy};
pub use version::VersionStrategy;

/// Wire provider, detector and memory from the loaded config.
fn build_conversation(config: &Config) -> anyhow::Result<ConversationManager> {
    let gemini = &config.providers.gemini;
    if gemini.api_key.is_empty() {
        anyhow::bail!(
            "Gemini API key not configured. Set \"providers.gemini.api_key\" in config or export GEMINI_API_KEY"
        );
    }

    let mut provider = GeminiProvider::new(gemini.api_key.clone())
        .with_model(gemini.model.clone())
        .with_generation(config.generation.clone());
    if let Some(base_url) = &gemini.base_url {
        provider = provider.with_base_url(base_url.clone());
    }

    info!("User memories stored in {}", config.memory.dir.display());
    let memory = Arc::new(MemoryManager::new(&config.memory));

    let provider: Arc<dyn LLMProvider> = Arc::new(provider);
    let detector: Arc<dyn LanguageDetector> = Arc::new(ScriptDetector::new());

    let conversation_config = ConversationConfig::default()
        .with_personality(config.personality().to_string())
        .with_context_budget(config.memory.context_budget);

    Ok(ConversationManager::new(
        provider,
        detector,
        memory,
        conversation_config,
    ))
}

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type, so
/// adding a command only requires implementing this trait.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
