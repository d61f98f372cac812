#![warn(
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

//! One conversational turn at a time, with durable per-user memory.
//!
//! # Turn flow
//! 1. Detect the language of text turns and record it when detected
//! 2. Select a bounded window of prior history
//! 3. Ask the completion service with personality, history and the new message
//! 4. Append the exchange to memory on success
//!
//! Completion failures never reach the user as raw errors; they become short
//! apology replies. A token-limit failure is retried after evicting old
//! history, a bounded number of times.

mod history;
mod manager;
mod turn;

pub use history::build_request;
pub use manager::{ConversationConfig, ConversationError, ConversationManager};
pub use turn::{Reply, ReplyKind, TurnInput};
