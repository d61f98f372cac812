use teloxide::types::BotCommand;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/language` with an optional language code
    Language(Option<String>),
}

impl Command {
    fn all() -> Vec<BotCommand> {
        vec![
            BotCommand {
                command: "start".to_string(),
                description: "Say hello to Nyxie".to_string(),
            },
            BotCommand {
                command: "language".to_string(),
                description: "Set your language, e.g. /language en".to_string(),
            },
            BotCommand {
                command: "help".to_string(),
                description: "Show help".to_string(),
            },
        ]
    }

    #[must_use]
    pub fn bot_commands() -> Vec<BotCommand> {
        Self::all()
    }

    /// Parse a command message. Returns `None` for ordinary text and for
    /// unknown commands.
    #[must_use]
    pub fn parse_from_text(text: &str) -> Option<Self> {
        let mut parts = text.split_whitespace();
        let head = parts.next()?.to_lowercase();

        // Remove bot mention if present (e.g., "/start@my_bot")
        let name = head.split('@').next().unwrap_or(&head);

        match name {
            "/start" => Some(Self::Start),
            "/help" => Some(Self::Help),
            "/language" => Some(Self::Language(parts.next().map(str::to_lowercase))),
            _ => None,
        }
    }

    #[must_use]
    pub const fn help_text() -> &'static str {
        r"
🤖 Nyxie

Commands:
/start - Say hello
/language <code> - Set your language (e.g. /language en)
/help - Show this help

Send me a message, a photo or a video to start chatting!
"
    }

    #[must_use]
    pub const fn welcome_text() -> &'static str {
        "Hello! I'm Nyxie, a Protogen. I'm here to chat, help, and learn with you! \
Feel free to talk to me about anything or share images and videos with me. \
I'll automatically detect your language and respond accordingly."
    }
}
