//! A local fake model for testing purpose.

mod preset;

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use persona_chat_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => {
                write!(f, "API request failed ({status}): {}", self.message)
            }
            None => write!(f, "{}", self.message),
        }
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn status_code(&self) -> Option<u16> {
        self.status
    }
}

#[derive(Clone)]
enum ConversationStep {
    System,
    UserInput,
    AssistantReply(PresetReply),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the conversation script, which
/// is how the model should respond to a request. The step is selected by
/// the number of messages in the request: a request carrying `n` messages
/// is answered by the step at index `n`, which must be an assistant step.
/// A typical script is therefore system, user, assistant, user, assistant.
/// If there are no enough steps in the script, an error will be returned.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    requests: Arc<AtomicUsize>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_system_step(&mut self) {
        self.conversation_script.push(ConversationStep::System);
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    #[inline]
    pub fn add_assistant_reply_step(&mut self, preset: PresetReply) {
        self.conversation_script
            .push(ConversationStep::AssistantReply(preset));
    }

    /// Adds a user step followed by an assistant step, which is one round
    /// trip of the conversation.
    #[inline]
    pub fn add_round_trip(&mut self, preset: PresetReply) {
        self.add_user_input_step();
        self.add_assistant_reply_step(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns how many requests this provider (and its clones) received.
    #[inline]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn reply_for(&self, req: &ModelRequest) -> Result<String, Error> {
        if !matches!(req.messages.first(), Some(ModelMessage::System(_))) {
            return Err(Error {
                message: "request does not start with a system message"
                    .to_owned(),
                kind: ErrorKind::Transport,
                status: None,
            });
        }

        let step_idx = req.messages.len();
        let preset = match self.conversation_script.get(step_idx) {
            Some(ConversationStep::AssistantReply(preset)) => preset,
            Some(_) => {
                return Err(Error {
                    message: "not an assistant reply step".to_owned(),
                    kind: ErrorKind::Transport,
                    status: None,
                });
            }
            None => {
                return Err(Error {
                    message: "no enough steps".to_owned(),
                    kind: ErrorKind::Transport,
                    status: None,
                });
            }
        };

        match preset {
            PresetReply::Text(text) if text.trim().is_empty() => Err(Error {
                message: "the model returned an empty reply".to_owned(),
                kind: ErrorKind::EmptyResponse,
                status: None,
            }),
            PresetReply::Text(text) => Ok(text.trim().to_owned()),
            PresetReply::Failure(failure) => Err(Error {
                message: failure.message.clone(),
                kind: failure.kind,
                status: failure.status,
            }),
        }
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let result = self.reply_for(req);
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        async move {
            sleep(delay).await;
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scripted() -> TestModelProvider {
        let mut provider = TestModelProvider::default();
        provider.add_system_step();
        provider.add_round_trip(PresetReply::text("Hello, world!"));
        provider.add_round_trip(PresetReply::api_failure(401, "bad key"));
        provider
    }

    #[tokio::test]
    async fn test_complete() {
        let provider = scripted();

        let mut req = ModelRequest {
            messages: vec![
                ModelMessage::System("You are X".to_owned()),
                ModelMessage::User("Hi".to_owned()),
            ],
        };
        let reply = provider.complete(&req).await.unwrap();
        assert_eq!(reply, "Hello, world!");

        req.messages.push(ModelMessage::Assistant(reply));
        req.messages.push(ModelMessage::User("Again".to_owned()));
        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("bad key"));

        assert_eq!(provider.clone().request_count(), 2);
    }

    #[tokio::test]
    async fn test_blank_text_is_empty_response() {
        let mut provider = TestModelProvider::default();
        provider.add_system_step();
        provider.add_round_trip(PresetReply::text("   "));

        let req = ModelRequest {
            messages: vec![
                ModelMessage::System("You are X".to_owned()),
                ModelMessage::User("Hi".to_owned()),
            ],
        };
        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
        assert_eq!(err.status_code(), None);
    }

    #[tokio::test]
    async fn test_script_mismatch() {
        let provider = scripted();
        let req = ModelRequest {
            messages: vec![ModelMessage::System("You are X".to_owned())],
        };
        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);

        let req = ModelRequest {
            messages: vec![ModelMessage::User("Hi".to_owned())],
        };
        assert!(provider.complete(&req).await.is_err());
    }
}
