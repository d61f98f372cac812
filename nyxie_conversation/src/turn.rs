//! Inputs and outputs of a single turn.

use nyxie_core::{MediaAttachment, MediaKind};

const DEFAULT_IMAGE_CAPTION: &str = "What do you see in this image?";
const DEFAULT_VIDEO_CAPTION: &str = "What's happening in this video?";

/// What the user sent in one turn.
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// Message text, or the caption for media
    pub text: String,
    /// Attached media, if any
    pub media: Option<MediaAttachment>,
}

impl TurnInput {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media: None,
        }
    }

    /// Photo turn. A missing or blank caption gets a default question.
    #[must_use]
    pub fn image(caption: Option<String>, data: Vec<u8>) -> Self {
        Self::media(MediaKind::Image, caption, data)
    }

    /// Video turn. A missing or blank caption gets a default question.
    #[must_use]
    pub fn video(caption: Option<String>, data: Vec<u8>) -> Self {
        Self::media(MediaKind::Video, caption, data)
    }

    fn media(kind: MediaKind, caption: Option<String>, data: Vec<u8>) -> Self {
        let default = match kind {
            MediaKind::Image => DEFAULT_IMAGE_CAPTION,
            MediaKind::Video => DEFAULT_VIDEO_CAPTION,
        };
        let text = caption
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| default.to_string());
        Self {
            text,
            media: Some(MediaAttachment::new(kind, data)),
        }
    }

    #[must_use]
    pub fn media_kind(&self) -> Option<MediaKind> {
        self.media.as_ref().map(|m| m.kind)
    }

    /// Text remembered for this turn; media is kept only as a labelled caption.
    #[must_use]
    pub fn history_entry(&self) -> String {
        match self.media_kind() {
            Some(kind) => format!("{} {}", kind.label(), self.text),
            None => self.text.clone(),
        }
    }

    fn subject(&self) -> &'static str {
        match self.media_kind() {
            Some(MediaKind::Image) => "image",
            Some(MediaKind::Video) => "video",
            None => "message",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Text produced by the completion service
    Generated,
    /// Generic apology after a failure
    Apology,
    /// History was exhausted while shrinking to fit the token limit
    MemoryExhausted,
}

/// Text to send back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub kind: ReplyKind,
}

impl Reply {
    #[must_use]
    pub const fn generated(text: String) -> Self {
        Self {
            text,
            kind: ReplyKind::Generated,
        }
    }

    #[must_use]
    pub fn apology(input: &TurnInput) -> Self {
        let text = match input.media_kind() {
            None => "I apologize, but I encountered an error. Please try again.".to_string(),
            Some(_) => format!(
                "I apologize, but I had trouble processing that {}. Please try again.",
                input.subject()
            ),
        };
        Self {
            text,
            kind: ReplyKind::Apology,
        }
    }

    #[must_use]
    pub fn memory_exhausted(input: &TurnInput) -> Self {
        Self {
            text: format!(
                "I apologize, but I couldn't process your {} due to memory constraints.",
                input.subject()
            ),
            kind: ReplyKind::MemoryExhausted,
        }
    }

    /// Reply used when the turn failed before reaching the completion service.
    #[must_use]
    pub fn generic_apology() -> Self {
        Self::apology(&TurnInput::text(String::new()))
    }

    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.kind == ReplyKind::Generated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_entries() {
        assert_eq!(TurnInput::text("hello").history_entry(), "hello");
        assert_eq!(
            TurnInput::image(Some("my cat".to_string()), vec![]).history_entry(),
            "[Image] my cat"
        );
        assert_eq!(
            TurnInput::video(None, vec![]).history_entry(),
            "[Video] What's happening in this video?"
        );
        assert_eq!(
            TurnInput::image(Some("   ".to_string()), vec![]).text,
            "What do you see in this image?"
        );
    }

    #[test]
    fn test_apologies_name_the_subject() {
        let video = TurnInput::video(None, vec![1]);
        assert_eq!(
            Reply::apology(&video).text,
            "I apologize, but I had trouble processing that video. Please try again."
        );
        assert_eq!(
            Reply::memory_exhausted(&video).text,
            "I apologize, but I couldn't process your video due to memory constraints."
        );
        assert_eq!(
            Reply::generic_apology().text,
            "I apologize, but I encountered an error. Please try again."
        );
        assert!(!Reply::generic_apology().is_generated());
    }
}
