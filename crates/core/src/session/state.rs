use std::fmt::{self, Debug};

use tokio::sync::{mpsc, oneshot};

use super::SessionSnapshot;
use crate::model_client::ModelClient;
use crate::notice::Notice;
use crate::orchestrator::{Effect, Event, Orchestrator, Update};
use crate::persistence::Persistence;
use crate::storage::KeyValueStore;

const SAVE_FAILED_NOTICE: &str =
    "Failed to save conversation history; local storage may be full.";

pub(crate) enum Request {
    Event(Event),
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

impl Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Request::Snapshot(_) => f.debug_tuple("Snapshot").finish_non_exhaustive(),
        }
    }
}

pub(super) struct SessionState {
    pub(super) orchestrator: Orchestrator,
    pub(super) persistence: Persistence<Box<dyn KeyValueStore>>,
    pub(super) model_client: ModelClient,
    pub(super) on_update: Option<Box<dyn Fn(Update) + Send + Sync>>,
    // Weak, so that the task ends once every `Session` handle is gone.
    pub(super) tx: mpsc::WeakUnboundedSender<Request>,
}

impl SessionState {
    pub(super) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Request>) {
        while let Some(request) = rx.recv().await {
            match request {
                Request::Event(event) => self.handle_event(event),
                Request::Snapshot(reply_tx) => {
                    reply_tx.send(self.snapshot()).ok();
                }
            }
        }
        debug!("session task finished");
    }

    fn handle_event(&mut self, event: Event) {
        for effect in self.orchestrator.handle(event) {
            match effect {
                Effect::Update(update) => self.emit(update),
                Effect::CallModel(request) => self.call_model(request),
                Effect::Persist => self.persist(),
            }
        }
    }

    fn call_model(&self, request: persona_chat_model::ModelRequest) {
        let Some(tx) = self.tx.upgrade() else {
            // Only possible while the task is shutting down.
            warn!("no session handle left, not calling the model");
            return;
        };
        let model_client = self.model_client.clone();
        tokio::spawn(async move {
            let event = match model_client.complete(request).await {
                Ok(reply) => Event::ModelReplied(reply),
                Err(err) => Event::ModelFailed(err),
            };
            tx.send(Request::Event(event)).ok();
        });
    }

    fn persist(&self) {
        if let Err(err) = self.persistence.save(self.orchestrator.conversation()) {
            error!("failed to save the conversation: {err}");
            self.emit(Update::Notice(Notice::warning(SAVE_FAILED_NOTICE)));
        }
    }

    #[inline]
    fn emit(&self, update: Update) {
        if let Some(on_update) = &self.on_update {
            on_update(update);
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        let conversation = self.orchestrator.conversation();
        SessionSnapshot {
            system_prompt: conversation.system_prompt().to_owned(),
            history: conversation.history().to_vec(),
            mode: self.orchestrator.mode(),
            busy: self.orchestrator.is_busy(),
        }
    }
}
