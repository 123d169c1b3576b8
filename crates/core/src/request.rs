//! Building model requests from the conversation.

use persona_chat_model::{ModelMessage, ModelRequest};

use crate::conversation::{Message, Role};

/// Composes the request for the next reply: the system prompt first, then
/// every history message in order.
///
/// `system_prompt` is expected to be non-empty; the orchestrator refuses
/// to send otherwise.
pub fn compose_request(system_prompt: &str, history: &[Message]) -> ModelRequest {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(ModelMessage::System(system_prompt.to_owned()));
    messages.extend(history.iter().map(to_model_message));
    ModelRequest { messages }
}

#[inline]
fn to_model_message(message: &Message) -> ModelMessage {
    let content = message.content().to_owned();
    match message.role() {
        Role::User => ModelMessage::User(content),
        Role::Assistant => ModelMessage::Assistant(content),
        Role::System => ModelMessage::System(content),
    }
}
