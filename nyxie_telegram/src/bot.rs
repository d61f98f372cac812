use crate::{Command, Result};
use nyxie_conversation::{ConversationManager, Reply, TurnInput};
use nyxie_memory::MemoryManager;
use std::{sync::Arc, time::Duration};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Telegram bot relaying turns to the conversation manager
#[derive(Clone)]
pub struct TelegramBot {
    /// Teloxide bot instance
    pub bot: Bot,
    /// Shared conversation manager; owns provider, detector and memory
    conversation: Arc<ConversationManager>,
}

impl TelegramBot {
    /// Create a new Telegram bot
    #[must_use]
    pub fn new(token: String, conversation: Arc<ConversationManager>) -> Self {
        Self {
            bot: Bot::new(token),
            conversation,
        }
    }

    #[must_use]
    pub fn memory(&self) -> &Arc<MemoryManager> {
        self.conversation.memory()
    }

    /// Run one turn and always come back with something to say.
    pub async fn process_turn(&self, user_id: &str, input: TurnInput) -> Reply {
        match self.conversation.process_turn(user_id, input).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Turn failed for user {user_id}: {e}");
                Reply::generic_apology()
            }
        }
    }

    /// Fetch a file's bytes from Telegram.
    pub async fn download(&self, file_id: FileId) -> Result<Vec<u8>> {
        let file = self.bot.get_file(file_id).await?;
        let mut data = Vec::new();
        self.bot.download_file(&file.path, &mut data).await?;
        info!("Downloaded {} bytes from {}", data.len(), file.path);
        Ok(data)
    }

    /// Test connection to Telegram API with backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(bot_user) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        bot_user
                            .user
                            .username
                            .unwrap_or_else(|| "no username".to_string()),
                        bot_user.user.id
                    );
                    return;
                }
                Err(e) => {
                    // 2s, 4s, 6s, 8s, 10s, 10s, ...
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);

                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    if attempt == 1 {
                        warn!("This may be due to:");
                        warn!("  - Network connectivity issues");
                        warn!("  - Firewall blocking api.telegram.org");
                        warn!("  - Invalid bot token");
                        warn!("  - Telegram API being temporarily unavailable");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::Update;

        self.test_connection().await;

        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {e}");
        }

        let bot = self.bot.clone();

        let schema = dptree::entry().branch(Update::filter_message().endpoint({
            let bot_clone = self.clone();
            move |_bot: Bot, msg: teloxide::types::Message| {
                let bot_clone = bot_clone.clone();
                async move { crate::handler::handle_message(bot_clone, msg).await }
            }
        }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
