use nyxie_config::Config;
use nyxie_memory::MemoryManager;

/// Input for the Memory command.
#[derive(Debug, Clone)]
pub struct MemoryInput {
    pub user_id: String,
}

/// Strategy for inspecting one user's stored record.
#[derive(Debug, Clone, Copy)]
pub struct MemoryStrategy;

impl super::CommandStrategy for MemoryStrategy {
    type Input = MemoryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let memory = MemoryManager::new(&config.memory);

        let path = memory.store().path_for(&input.user_id);
        let stats = memory.stats(&input.user_id).await?;

        println!("=== Memory for user {} ===\n", input.user_id);
        println!("  File: {}", path.display());
        println!("  Language: {}", stats.language);
        println!(
            "  Messages: {} ({} user, {} model)",
            stats.messages, stats.user_messages, stats.model_messages
        );
        println!(
            "  Retained size: {} / {}",
            stats.total_size,
            memory.accountant().max_retained_size()
        );

        let window = memory.select_window(&input.user_id, None).await?;
        println!(
            "  Context window: {} messages within budget {}",
            window.len(),
            memory.context_budget()
        );

        Ok(())
    }
}
