//! Terminal conversation backed by the same per-user memory as the bot.

use nyxie_config::Config;
use nyxie_conversation::TurnInput;
use tracing::info;

use super::build_conversation;

/// Input parameters for the Chat command strategy.
#[derive(Debug, Clone)]
pub struct ChatInput {
    /// Memory owner for this conversation
    pub user_id: String,
    /// Optional single message to send (non-interactive mode)
    pub message: Option<String>,
}

/// Strategy for executing the Chat command.
///
/// With a message, runs one turn and prints the reply; otherwise reads turns
/// from stdin until `exit`.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = ChatInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let manager = build_conversation(&config)?;

        info!("Starting conversation as user {}", input.user_id);

        if let Some(msg) = input.message {
            let reply = manager
                .process_turn(&input.user_id, TurnInput::text(msg))
                .await?;
            println!("{}", reply.text);
            info!(
                "Turn completed ({:?}), {} messages remembered",
                reply.kind,
                manager.memory().message_count(&input.user_id).await?
            );
        } else {
            manager.run_interactive(&input.user_id).await?;
        }

        Ok(())
    }
}
