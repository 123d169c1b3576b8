//! Loading and saving the conversation through a [`KeyValueStore`].
//!
//! Two keys are used: the system prompt, verbatim, and the most recent
//! [`HISTORY_LIMIT`] messages as a JSON array. The keys are written one
//! after the other without any transaction; both are rewritten after every
//! round trip, so a torn write heals on the next save.

use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::conversation::{Conversation, Message};
use crate::storage::{KeyValueStore, StorageError};

/// Key of the system prompt.
pub const SYSTEM_PROMPT_KEY: &str = "persona_chat_system_prompt";
/// Key of the JSON-encoded message history.
pub const MESSAGES_KEY: &str = "persona_chat_messages";
/// The maximum number of messages kept in storage.
pub const HISTORY_LIMIT: usize = 50;

/// What was found in storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistedSnapshot {
    pub system_prompt: String,
    pub history: Vec<Message>,
}

impl From<PersistedSnapshot> for Conversation {
    #[inline]
    fn from(snapshot: PersistedSnapshot) -> Self {
        Conversation::new(snapshot.system_prompt, snapshot.history)
    }
}

/// Why a stored history was discarded.
#[derive(Debug, Error)]
pub enum HistoryDecodeError {
    #[error("history is not a valid message array: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message {index} has blank content")]
    BlankContent { index: usize },

    #[error("message {index} has an invalid timestamp: {source}")]
    InvalidTimestamp {
        index: usize,
        #[source]
        source: time::error::Parse,
    },
}

/// Persistence adapter over a [`KeyValueStore`].
#[derive(Clone, Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    #[inline]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the persisted conversation.
    ///
    /// Never fails: missing keys yield empty values, and unreadable or
    /// malformed data is logged and replaced by an empty value.
    pub fn load(&self) -> PersistedSnapshot {
        let system_prompt = match self.store.get(SYSTEM_PROMPT_KEY) {
            Ok(value) => value.unwrap_or_default(),
            Err(err) => {
                warn!("failed to read the system prompt: {err}");
                String::new()
            }
        };

        let history = match self.store.get(MESSAGES_KEY) {
            Ok(Some(raw)) => decode_history(&raw).unwrap_or_else(|err| {
                warn!("discarding malformed message history: {err}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!("failed to read the message history: {err}");
                Vec::new()
            }
        };

        debug!(
            "loaded conversation with {} messages, prompt set: {}",
            history.len(),
            !system_prompt.is_empty()
        );
        PersistedSnapshot {
            system_prompt,
            history,
        }
    }

    /// Saves the system prompt and the last [`HISTORY_LIMIT`] messages.
    ///
    /// The in-memory conversation is left untouched whatever the outcome.
    pub fn save(&self, conversation: &Conversation) -> Result<(), StorageError> {
        self.store
            .set(SYSTEM_PROMPT_KEY, conversation.system_prompt())?;

        let history = conversation.history();
        let start = history.len().saturating_sub(HISTORY_LIMIT);
        let encoded = serde_json::to_string(&history[start..])?;
        self.store.set(MESSAGES_KEY, &encoded)?;

        trace!("saved {} of {} messages", history.len() - start, history.len());
        Ok(())
    }
}

fn decode_history(raw: &str) -> Result<Vec<Message>, HistoryDecodeError> {
    let history: Vec<Message> = serde_json::from_str(raw)?;
    for (index, message) in history.iter().enumerate() {
        if message.content().trim().is_empty() {
            return Err(HistoryDecodeError::BlankContent { index });
        }
        OffsetDateTime::parse(message.timestamp(), &Rfc3339).map_err(
            |source| HistoryDecodeError::InvalidTimestamp { index, source },
        )?;
    }
    Ok(history)
}
