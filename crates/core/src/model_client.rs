use std::pin::Pin;
use std::sync::Arc;

use persona_chat_model::{ModelProvider, ModelProviderError, ModelRequest};
use tracing::Instrument;

pub(crate) type CompleteResult = Result<String, Box<dyn ModelProviderError>>;
type BoxedCompleteFuture = Pin<Box<dyn Future<Output = CompleteResult> + Send>>;
type HandlerFn = Arc<dyn Fn(ModelRequest) -> BoxedCompleteFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased interface
/// for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let fut = provider.complete(&req);
            Box::pin(
                async move {
                    trace!("sending a request with {} messages", req.messages.len());
                    match fut.await {
                        Ok(reply) => {
                            trace!("got a reply of {} bytes", reply.len());
                            Ok(reply)
                        }
                        Err(err) => {
                            error!("got an error: {err:?}");
                            Err(Box::new(err) as Box<dyn ModelProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("model client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the reply text.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe as long as the provider's future is.
    #[inline]
    pub async fn complete(&self, req: ModelRequest) -> CompleteResult {
        (self.handler_fn)(req).await
    }
}

#[cfg(test)]
mod tests {
    use persona_chat_model::{ErrorKind, ModelMessage};
    use persona_chat_test_model::{PresetReply, TestModelProvider};

    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![
                ModelMessage::System("You are X".to_owned()),
                ModelMessage::User("Hi".to_owned()),
            ],
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_system_step();
        model_provider.add_round_trip(PresetReply::text("How are you?"));

        let model_client = ModelClient::new(model_provider.clone());

        for _ in 0..3 {
            let reply = model_client.complete(request()).await.unwrap();
            assert_eq!(reply, "How are you?");
        }
        assert_eq!(model_provider.request_count(), 3);
    }

    #[tokio::test]
    async fn test_error_handling() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_system_step();
        model_provider.add_round_trip(PresetReply::api_failure(500, "boom"));
        let model_client = ModelClient::new(model_provider);

        let err = model_client.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(500));
    }
}
