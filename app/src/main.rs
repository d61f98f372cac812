#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use clap::{Parser, Subcommand};
use command::{
    ChatInput, ChatStrategy, CommandStrategy, InfoStrategy, InitStrategy, MemoryInput,
    MemoryStrategy, TelegramInput, TelegramStrategy, VersionStrategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nyxie")]
#[command(about = "Nyxie, a Gemini-backed Telegram companion with per-user memory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show the loaded configuration
    Info,
    /// Talk to Nyxie from the terminal
    Chat {
        /// User whose memory the conversation uses
        #[arg(short = 'u', long, default_value = "cli")]
        user: String,

        /// Single message to send
        #[arg(short = 'm', long)]
        message: Option<String>,
    },
    /// Run the Telegram bot
    Telegram {
        /// Bot token (overrides config and TELEGRAM_TOKEN)
        #[arg(short = 't', long)]
        token: Option<String>,
    },
    /// Show what is remembered for a user
    Memory {
        /// User id as stored on disk
        #[arg(short = 'u', long)]
        user: String,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(()).await,
        Commands::Chat { user, message } => {
            ChatStrategy
                .execute(ChatInput {
                    user_id: user,
                    message,
                })
                .await
        }
        Commands::Telegram { token } => TelegramStrategy.execute(TelegramInput { token }).await,
        Commands::Memory { user } => MemoryStrategy.execute(MemoryInput { user_id: user }).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}
