//! Configuration for the Nyxie bot, stored at `~/nyxie/config.json`.

mod schema;

pub use schema::{Config, GeminiConfig, ProvidersConfig, TelegramConfig};
