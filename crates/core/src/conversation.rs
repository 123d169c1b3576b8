//! Conversation-related types.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::ValidationError;
use crate::mode::Mode;

/// The author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing.
    User,
    /// The model, or an in-persona error aside standing in for it.
    Assistant,
    /// System instructions.
    System,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A message in the conversation history.
///
/// Messages are immutable once created. The content is never blank and the
/// timestamp is an RFC 3339 string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
    timestamp: String,
}

impl Message {
    /// Creates a message stamped with the current time.
    #[inline]
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self::at(role, content, OffsetDateTime::now_utc())
    }

    /// Creates a message stamped with the given time.
    pub fn at<S: Into<String>>(
        role: Role,
        content: S,
        time: OffsetDateTime,
    ) -> Self {
        let content = content.into();
        debug_assert!(!content.trim().is_empty(), "message content is blank");
        // Formatting only fails for years outside 0..=9999.
        let timestamp = time.format(&Rfc3339).unwrap_or_default();
        Self {
            role,
            content,
            timestamp,
        }
    }

    /// Creates a user message stamped with the current time.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message stamped with the current time.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the RFC 3339 creation time.
    #[inline]
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// The in-memory conversation: the active system prompt and the ordered
/// history it applies to.
///
/// The history is never trimmed here. Only the persisted copy is limited,
/// see [`crate::persistence`].
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Conversation {
    system_prompt: String,
    history: Vec<Message>,
}

impl Conversation {
    /// Restores a conversation from previously persisted values.
    #[inline]
    pub fn new(system_prompt: String, history: Vec<Message>) -> Self {
        Self {
            system_prompt,
            history,
        }
    }

    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[inline]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Appends a message to the end of the history.
    #[inline]
    pub fn append(&mut self, message: Message) {
        self.history.push(message);
    }

    /// Empties the history. The system prompt is kept.
    #[inline]
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Replaces the system prompt with the trimmed `text`.
    ///
    /// Changing the persona invalidates the prior context, so the history
    /// is cleared as well.
    pub fn set_system_prompt(
        &mut self,
        text: &str,
    ) -> Result<(), ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptySystemPrompt);
        }
        self.system_prompt = text.to_owned();
        self.history.clear();
        Ok(())
    }

    /// Infers the display mode from the last message.
    ///
    /// Returns `None` when the last message was not written by the
    /// assistant, in which case the previous label should stay.
    pub fn infer_mode(&self) -> Option<Mode> {
        match self.history.last() {
            None => Some(Mode::Unset),
            Some(last) if last.role == Role::Assistant => {
                Some(Mode::classify(&last.content))
            }
            Some(_) => None,
        }
    }
}
