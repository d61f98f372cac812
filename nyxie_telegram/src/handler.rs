use crate::{Command, Error, Result, TelegramBot};
use nyxie_conversation::{Reply, TurnInput};
use teloxide::{
    requests::Requester,
    types::{ChatAction, Message},
};
use tracing::{debug, error, info};

fn sender(msg: &Message) -> Result<(String, String)> {
    let user = msg.from.as_ref().ok_or(Error::NoSender)?;
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| "unknown".to_string());
    Ok((user.id.0.to_string(), username))
}

/// Handle bot commands
pub async fn handle_command(bot: TelegramBot, msg: Message, cmd: Command) -> Result<()> {
    let (user_id, username) = sender(&msg)?;

    match cmd {
        Command::Start => {
            info!("[@{username}] Command: /start");
            bot.bot
                .send_message(msg.chat.id, Command::welcome_text())
                .await?;
        }
        Command::Help => {
            info!("[@{username}] Command: /help");
            bot.bot
                .send_message(msg.chat.id, Command::help_text())
                .await?;
        }
        Command::Language(Some(code)) => {
            info!("[@{username}] Command: /language {code}");
            let text = match bot.memory().set_language(&user_id, &code).await {
                Ok(()) => format!("Language has been set to: {code}"),
                Err(e) => {
                    error!("Failed to set language for user {user_id}: {e}");
                    Reply::generic_apology().text
                }
            };
            bot.bot.send_message(msg.chat.id, text).await?;
        }
        Command::Language(None) => {
            info!("[@{username}] Command: /language");
            let text = match bot.memory().get_language(&user_id).await {
                Ok(current) => format!(
                    "Please specify a language code (e.g., /language en). Current language: {current}"
                ),
                Err(e) => {
                    error!("Failed to read language for user {user_id}: {e}");
                    Reply::generic_apology().text
                }
            };
            bot.bot.send_message(msg.chat.id, text).await?;
        }
    }

    Ok(())
}

/// Handle any message (commands, text, photos or videos)
pub async fn handle_message(bot: TelegramBot, msg: Message) -> Result<()> {
    let (user_id, username) = sender(&msg)?;

    let input = if let Some(text) = msg.text() {
        if let Some(cmd) = Command::parse_from_text(text) {
            return handle_command(bot, msg, cmd).await;
        }
        info!("[@{username}] Message: {text}");
        TurnInput::text(text)
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.iter().max_by_key(|p| p.file.size)) {
        info!("[@{username}] Photo ({} bytes)", photo.file.size);
        let caption = msg.caption().map(str::to_string);
        match bot.download(photo.file.id.clone()).await {
            Ok(data) => TurnInput::image(caption, data),
            Err(e) => {
                error!("Error processing image: {e}");
                let reply = Reply::apology(&TurnInput::image(None, Vec::new()));
                bot.bot.send_message(msg.chat.id, reply.text).await?;
                return Ok(());
            }
        }
    } else if let Some(video) = msg.video() {
        info!("[@{username}] Video ({} bytes)", video.file.size);
        let caption = msg.caption().map(str::to_string);
        match bot.download(video.file.id.clone()).await {
            Ok(data) => TurnInput::video(caption, data),
            Err(e) => {
                error!("Error processing video: {e}");
                let reply = Reply::apology(&TurnInput::video(None, Vec::new()));
                bot.bot.send_message(msg.chat.id, reply.text).await?;
                return Ok(());
            }
        }
    } else {
        debug!("[@{username}] Ignoring unsupported message");
        return Ok(());
    };

    bot.bot
        .send_chat_action(msg.chat.id, ChatAction::Typing)
        .await?;

    let reply = bot.process_turn(&user_id, input).await;

    info!("[@{username}] Response ({:?}): {}", reply.kind, reply.text);

    bot.bot.send_message(msg.chat.id, reply.text).await?;

    Ok(())
}
