//! Telegram transport for Nyxie.

mod bot;
mod command;
mod error;
mod handler;

pub use bot::TelegramBot;
pub use command::Command;
pub use error::{Error, Result};
pub use handler::{handle_command, handle_message};
