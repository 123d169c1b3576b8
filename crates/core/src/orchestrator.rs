//! The conversation state machine.
//!
//! [`Orchestrator::handle`] maps an [`Event`] to a list of [`Effect`]s and
//! never performs I/O itself. The session driver executes the effects: it
//! calls the model for [`Effect::CallModel`], writes storage for
//! [`Effect::Persist`] and forwards [`Effect::Update`] to the front end.
//!
//! ```text
//!          Send (valid)
//!   Idle ───────────────▶ Sending
//!    ▲                       │
//!    └───────────────────────┘
//!     ModelReplied / ModelFailed
//! ```

use std::fmt;

use persona_chat_model::{ModelProviderError, ModelRequest};

use crate::conversation::{Conversation, Message};
use crate::error::ValidationError;
use crate::mode::Mode;
use crate::notice::Notice;
use crate::persona::error_aside;
use crate::request::compose_request;

const EMPTY_REPLY_REASON: &str = "the API returned an empty response";

/// Whether a round trip is outstanding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stage {
    #[default]
    Idle,
    Sending,
}

/// An input to the state machine.
pub enum Event {
    /// The user submitted text.
    Send(String),
    /// The outstanding request succeeded.
    ModelReplied(String),
    /// The outstanding request failed.
    ModelFailed(Box<dyn ModelProviderError>),
    /// The user saved a new system prompt.
    SaveSystemPrompt(String),
    /// The user asked to clear the history. Nothing happens unless the
    /// destructive action was confirmed.
    ClearHistory { confirmed: bool },
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Send(text) => f.debug_tuple("Send").field(text).finish(),
            Event::ModelReplied(text) => {
                f.debug_tuple("ModelReplied").field(text).finish()
            }
            Event::ModelFailed(err) => f
                .debug_tuple("ModelFailed")
                .field(&format_args!("{err}"))
                .finish(),
            Event::SaveSystemPrompt(text) => {
                f.debug_tuple("SaveSystemPrompt").field(text).finish()
            }
            Event::ClearHistory { confirmed } => f
                .debug_struct("ClearHistory")
                .field("confirmed", confirmed)
                .finish(),
        }
    }
}

/// Something the front end should reflect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Update {
    MessageAppended(Message),
    HistoryReset,
    ModeChanged(Mode),
    /// The processing flag changed. `false` is emitted at the end of every
    /// round trip, whatever its outcome.
    Busy(bool),
    Notice(Notice),
    /// An action was refused without touching the conversation.
    Rejected(ValidationError),
}

/// A command for the session driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Update(Update),
    /// Send this request to the model and feed the outcome back as
    /// [`Event::ModelReplied`] or [`Event::ModelFailed`].
    CallModel(ModelRequest),
    /// Write the conversation to storage.
    Persist,
}

/// Owns the conversation and the processing flag.
#[derive(Clone, Debug, Default)]
pub struct Orchestrator {
    conversation: Conversation,
    stage: Stage,
    mode: Mode,
}

impl Orchestrator {
    /// Creates an idle orchestrator over a restored conversation.
    pub fn new(conversation: Conversation) -> Self {
        let mode = conversation.infer_mode().unwrap_or_default();
        Self {
            conversation,
            stage: Stage::Idle,
            mode,
        }
    }

    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.stage == Stage::Sending
    }

    /// The current display mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        trace!("handling {event:?} in {:?}", self.stage);
        match event {
            Event::Send(text) => self.send(&text),
            Event::ModelReplied(reply) => {
                // Messages never have blank content; treat it as a failure.
                let message = if reply.trim().is_empty() {
                    warn!("model returned a blank reply");
                    Message::assistant(error_aside(EMPTY_REPLY_REASON))
                } else {
                    Message::assistant(reply)
                };
                self.finish_round_trip(message)
            }
            Event::ModelFailed(err) => {
                let aside = error_aside(&err.to_string());
                self.finish_round_trip(Message::assistant(aside))
            }
            Event::SaveSystemPrompt(text) => self.save_system_prompt(&text),
            Event::ClearHistory { confirmed } => self.clear_history(confirmed),
        }
    }

    fn send(&mut self, text: &str) -> Vec<Effect> {
        let text = text.trim();
        if text.is_empty() {
            return rejected(ValidationError::EmptyInput);
        }
        if self.conversation.system_prompt().is_empty() {
            return rejected(ValidationError::MissingSystemPrompt);
        }
        if self.stage == Stage::Sending {
            return rejected(ValidationError::Busy);
        }

        let message = Message::user(text);
        self.conversation.append(message.clone());
        self.stage = Stage::Sending;

        let request = compose_request(
            self.conversation.system_prompt(),
            self.conversation.history(),
        );
        let mut effects = vec![Effect::Update(Update::MessageAppended(message))];
        effects.extend(self.refresh_mode());
        effects.push(Effect::Update(Update::Busy(true)));
        effects.push(Effect::CallModel(request));
        effects
    }

    fn finish_round_trip(&mut self, message: Message) -> Vec<Effect> {
        if self.stage != Stage::Sending {
            warn!("ignoring a model outcome that arrived while idle");
            return Vec::new();
        }

        self.conversation.append(message.clone());
        self.stage = Stage::Idle;

        let mut effects = vec![Effect::Update(Update::MessageAppended(message))];
        effects.extend(self.refresh_mode());
        effects.push(Effect::Persist);
        effects.push(Effect::Update(Update::Busy(false)));
        effects
    }

    fn save_system_prompt(&mut self, text: &str) -> Vec<Effect> {
        if self.stage == Stage::Sending {
            return rejected(ValidationError::Busy);
        }
        if let Err(err) = self.conversation.set_system_prompt(text) {
            return rejected(err);
        }
        info!("system prompt replaced, conversation reset");
        self.after_reset("System prompt saved; the conversation has been reset.")
    }

    fn clear_history(&mut self, confirmed: bool) -> Vec<Effect> {
        if !confirmed {
            return Vec::new();
        }
        if self.stage == Stage::Sending {
            return rejected(ValidationError::Busy);
        }
        self.conversation.reset();
        info!("conversation history cleared");
        self.after_reset("Conversation history cleared.")
    }

    fn after_reset(&mut self, notice: &str) -> Vec<Effect> {
        let mut effects = vec![Effect::Update(Update::HistoryReset)];
        effects.extend(self.refresh_mode());
        effects.push(Effect::Persist);
        effects.push(Effect::Update(Update::Notice(Notice::success(notice))));
        effects
    }

    fn refresh_mode(&mut self) -> Option<Effect> {
        let mode = self.conversation.infer_mode()?;
        self.mode = mode;
        Some(Effect::Update(Update::ModeChanged(mode)))
    }
}

#[inline]
fn rejected(err: ValidationError) -> Vec<Effect> {
    debug!("rejected: {err}");
    vec![Effect::Update(Update::Rejected(err))]
}
