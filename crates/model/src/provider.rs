use std::error::Error;

use crate::error::ErrorKind;
use crate::request::ModelRequest;

/// The error type for a model provider.
pub trait ModelProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;

    /// Returns the HTTP status code reported by the endpoint, if the
    /// error is an [`ErrorKind::Api`] error.
    fn status_code(&self) -> Option<u16> {
        None
    }
}

/// A type that represents a model provider, which is an entry for sending
/// completion requests.
///
/// Once the provider is created, it should behave like a stateless object.
/// It can still have internal state, but callers should not rely on it,
/// and the provider should be prepared for being dropped anytime.
pub trait ModelProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ModelProviderError;

    /// Sends a request to the model and resolves to the reply text.
    ///
    /// Exactly one attempt is made per call. The returned text is trimmed
    /// and never empty; an empty reply is reported as
    /// [`ErrorKind::EmptyResponse`].
    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}
