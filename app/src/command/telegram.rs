use crate::command::CommandStrategy;
use nyxie_config::Config;
use nyxie_telegram::TelegramBot;
use std::sync::Arc;
use tracing::info;

use super::build_conversation;

/// Input for Telegram bot command.
pub struct TelegramInput {
    /// Optional bot token (overrides config)
    pub token: Option<String>,
}

/// Strategy for running Telegram bot.
pub struct TelegramStrategy;

impl CommandStrategy for TelegramStrategy {
    type Input = TelegramInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        // Get token from input or config
        let token = if let Some(t) = input.token {
            t
        } else if !config.telegram.token.is_empty() {
            config.telegram.token.clone()
        } else {
            anyhow::bail!(
                "Telegram bot token not configured. Set \"telegram.token\" in config or export TELEGRAM_TOKEN"
            );
        };

        info!("Starting Telegram bot...");

        let conversation = Arc::new(build_conversation(&config)?);
        let bot = TelegramBot::new(token, conversation);

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
