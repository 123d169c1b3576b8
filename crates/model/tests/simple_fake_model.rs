use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::time::Duration;

use persona_chat_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
};
use tokio::time::sleep;

#[derive(Debug)]
struct FakeModelProviderError(ErrorKind);

impl Display for FakeModelProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for FakeModelProviderError {}

impl ModelProviderError for FakeModelProviderError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

/// Echoes the last user message back, after a short delay.
struct FakeModelProvider;

impl ModelProvider for FakeModelProvider {
    type Error = FakeModelProviderError;

    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let last_user = req.messages.iter().rev().find_map(|msg| match msg {
            ModelMessage::User(text) => Some(text.clone()),
            _ => None,
        });
        async move {
            sleep(Duration::from_millis(1)).await;
            match last_user {
                Some(text) => Ok(format!("You said {text}")),
                None => Err(FakeModelProviderError(ErrorKind::EmptyResponse)),
            }
        }
    }
}

/// Always fails without doing any I/O.
struct UnconfiguredProvider;

impl ModelProvider for UnconfiguredProvider {
    type Error = FakeModelProviderError;

    fn complete(
        &self,
        _req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        ready(Err(FakeModelProviderError(ErrorKind::Configuration)))
    }
}

mod tests {
    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![
                ModelMessage::System("Be brief.".to_string()),
                ModelMessage::User("Good morning".to_string()),
            ],
        };
        let reply = provider.complete(&req).await.unwrap();
        assert_eq!(reply, "You said Good morning");
    }

    #[tokio::test]
    async fn test_error() {
        let provider = FakeModelProvider;
        let req = ModelRequest {
            messages: vec![ModelMessage::System("Be brief.".to_string())],
        };
        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
        assert_eq!(err.status_code(), None);

        let err = UnconfiguredProvider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_message_wire_shape() {
        let msg = ModelMessage::Assistant("hi".to_owned());
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "role": "assistant", "content": "hi" })
        );
        assert_eq!(msg.content(), "hi");
    }
}
