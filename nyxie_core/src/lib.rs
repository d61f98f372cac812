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

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod util;

pub use util::{DEFAULT_PERSONALITY, build_prompt};

/// Author of a conversational turn.
///
/// Only two roles exist in stored history. Any label other than `"user"`
/// (for example `"assistant"`) is read back as [`Role::Model`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Model,
}

impl Role {
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "user" { Self::User } else { Self::Model }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl From<String> for Role {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Image => "image/jpeg",
            Self::Video => "video/mp4",
        }
    }

    /// Tag prefixed to the textual description kept in history.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "[Image]",
            Self::Video => "[Video]",
        }
    }
}

/// Raw media sent alongside a prompt.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub data: Vec<u8>,
}

impl MediaAttachment {
    #[must_use]
    pub const fn new(kind: MediaKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

impl std::fmt::Debug for MediaAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAttachment")
            .field("kind", &self.kind)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Everything the completion service needs for one call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Prior turns, oldest first. Never contains the in-flight message.
    pub history: Vec<ChatMessage>,
    pub prompt: String,
    pub media: Option<MediaAttachment>,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    /// The request (history plus prompt) was too large for the model.
    #[error("token limit exceeded: {0}")]
    TokenLimitExceeded(String),

    #[error("empty response from completion service")]
    EmptyResponse,

    #[error("completion service error: {0}")]
    Service(#[from] anyhow::Error),
}

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
    fn get_default_model(&self) -> &str;
}

#[async_trait]
impl<T: LLMProvider + ?Sized> LLMProvider for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        (**self).complete(request).await
    }

    fn get_default_model(&self) -> &str {
        (**self).get_default_model()
    }
}

/// Outcome of running language detection over a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Detected(String),
    NotDetected,
}

impl Detection {
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Detected(tag) => Some(tag),
            Self::NotDetected => None,
        }
    }
}

pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> Detection;
}

impl<T: LanguageDetector + ?Sized> LanguageDetector for Arc<T> {
    fn detect(&self, text: &str) -> Detection {
        (**self).detect(text)
    }
}
