//! The async driver around [`Orchestrator`].
//!
//! A session owns one task that holds the conversation. Requests from the
//! cloneable [`Session`] handle and model outcomes are processed by that
//! task one at a time, so the processing flag never needs a lock.

mod builder;
mod state;

use tokio::sync::{mpsc, oneshot};

use crate::conversation::Message;
use crate::mode::Mode;
use crate::orchestrator::Event;
pub use builder::SessionBuilder;
use state::Request;

/// A point-in-time copy of the session state, for rendering.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub system_prompt: String,
    pub history: Vec<Message>,
    pub mode: Mode,
    pub busy: bool,
}

/// A handle to a running session.
///
/// Every action is fire-and-forget; its outcome is reported through the
/// `on_update` callback of [`SessionBuilder`]. The session task stops once
/// every handle is dropped and no request is outstanding.
#[derive(Clone, Debug)]
pub struct Session {
    tx: mpsc::UnboundedSender<Request>,
}

impl Session {
    /// Sends a user message. Rejected while another message is being
    /// processed.
    #[inline]
    pub fn send_message<S: Into<String>>(&self, text: S) {
        self.dispatch(Event::Send(text.into()));
    }

    /// Replaces the system prompt and resets the conversation.
    #[inline]
    pub fn save_system_prompt<S: Into<String>>(&self, text: S) {
        self.dispatch(Event::SaveSystemPrompt(text.into()));
    }

    /// Clears the conversation history if `confirmed` is true.
    #[inline]
    pub fn clear_history(&self, confirmed: bool) {
        self.dispatch(Event::ClearHistory { confirmed });
    }

    /// Returns the current state, or `None` if the session task is gone.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx.send(Request::Snapshot(reply_tx)).ok()?;
        reply_rx.await.ok()
    }

    fn dispatch(&self, event: Event) {
        if self.tx.send(Request::Event(event)).is_err() {
            error!("session task has stopped, dropping the request");
        }
    }
}
