use persona_chat_model::ModelProvider;
use tokio::sync::mpsc;

use super::Session;
use super::state::SessionState;
use crate::model_client::ModelClient;
use crate::orchestrator::{Orchestrator, Update};
use crate::persistence::Persistence;
use crate::storage::{KeyValueStore, MemoryStore};

/// [`Session`] builder.
pub struct SessionBuilder {
    model_client: ModelClient,
    store: Option<Box<dyn KeyValueStore>>,
    on_update: Option<Box<dyn Fn(Update) + Send + Sync>>,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            store: None,
            on_update: None,
        }
    }

    /// Sets the store the conversation is loaded from and saved to.
    ///
    /// Without one, the conversation lives in memory only.
    #[inline]
    pub fn with_store<S: KeyValueStore>(mut self, store: S) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Attaches a callback to be invoked for every update the front end
    /// should reflect.
    ///
    /// The callback runs on the session task and should not block.
    #[inline]
    pub fn on_update(
        mut self,
        on_update: impl Fn(Update) + Send + Sync + 'static,
    ) -> Self {
        self.on_update = Some(Box::new(on_update));
        self
    }

    /// Loads the persisted conversation and starts the session task.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn build(self) -> Session {
        let Self {
            model_client,
            store,
            on_update,
        } = self;

        let store = store.unwrap_or_else(|| Box::new(MemoryStore::new()));
        let persistence = Persistence::new(store);
        let orchestrator = Orchestrator::new(persistence.load().into());

        let (tx, rx) = mpsc::unbounded_channel();
        let state = SessionState {
            orchestrator,
            persistence,
            model_client,
            on_update,
            tx: tx.downgrade(),
        };
        tokio::spawn(state.run(rx));

        Session { tx }
    }
}
