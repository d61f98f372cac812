//! Turning stored history into a completion request.

use nyxie_core::{ChatMessage, CompletionRequest, build_prompt};
use nyxie_memory::Message;

use crate::turn::TurnInput;

/// Build the request for one turn.
///
/// The window goes in as prior turns, oldest first. The new message is not
/// part of the window; it is wrapped with the personality preamble and sent
/// as the prompt together with any media.
#[must_use]
pub fn build_request(personality: &str, window: &[Message], input: &TurnInput) -> CompletionRequest {
    CompletionRequest {
        history: window.iter().map(Message::to_chat_message).collect::<Vec<ChatMessage>>(),
        prompt: build_prompt(personality, &input.text),
        media: input.media.clone(),
    }
}
