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

//! Durable per-user conversational memory.
//!
//! Each user owns one [`UserRecord`] holding their chronological message
//! history and last known language. Records are loaded lazily, bounded by an
//! approximate token budget with oldest-first eviction, and written through to
//! one JSON file per user after every mutation.
//!
//! # Components
//! - [`RecordStore`]: lazy load-or-create, per-user locking, write-through persistence
//! - [`TokenAccountant`]: size estimation and retention bounding
//! - [`select_window`]: bounded context window for the next completion call
//! - language tracking on [`MemoryManager`]

mod accountant;
mod error;
mod language;
mod manager;
mod record;
mod store;
mod window;

pub use accountant::{DEFAULT_MAX_RETAINED_SIZE, TokenAccountant, estimate_size};
pub use error::{MemoryError, Result};
pub use language::DEFAULT_LANGUAGE;
pub use manager::{MemoryConfig, MemoryManager, RecordStats};
pub use record::{Message, RECORD_VERSION, UserRecord};
pub use store::{RecordGuard, RecordStore};
pub use window::{DEFAULT_CONTEXT_BUDGET, select_window, window_size};
