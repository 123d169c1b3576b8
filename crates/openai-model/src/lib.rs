//! A model provider for OpenAI-compatible chat completion APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use persona_chat_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest,
};
use reqwest::{Client, header};

pub use config::{
    API_KEY_ENV, BASE_URL_ENV, MAX_TOKENS_ENV, MODEL_ENV, OpenAIConfig,
    OpenAIConfigBuilder,
};

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<u16>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
        }
    }

    fn api(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ErrorKind::Api,
            status: Some(status),
        }
    }

    /// Returns the error message.
    ///
    /// For [`ErrorKind::Api`] errors this is the message extracted from the
    /// response body, without the status code.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }

    /// Returns the configuration of this provider.
    #[inline]
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    fn complete(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        // The key is resolved before anything touches the network.
        let api_key = self.config.resolve_api_key();
        let resp_fut = api_key.as_ref().map(|api_key| {
            let openai_req = proto::create_request(req, &self.config);
            self.client
                .post(self.config.completions_url())
                .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
                .header(header::CONTENT_TYPE, "application/json")
                .json(&openai_req)
                .send()
        });

        async move {
            let Some(resp_fut) = resp_fut else {
                return Err(Error::new(
                    format!(
                        "API key is not configured; set {API_KEY_ENV} or \
                         provide one in the configuration"
                    ),
                    ErrorKind::Configuration,
                ));
            };

            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            let status = resp.status();
            let body = resp.text().await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            trace!("got response ({status}): {body}");

            if !status.is_success() {
                let err = proto::api_error(status.as_u16(), &body);
                error!("completion request failed: {err}");
                return Err(err);
            }

            proto::extract_reply(&body)
        }
    }
}

#[cfg(test)]
mod tests {
    use persona_chat_model::ModelMessage;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use super::*;

    /// Serves one canned response on a local port. The handle resolves to
    /// the raw request that was received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).await.unwrap();
                received.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&received) {
                    break;
                }
            }

            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
            String::from_utf8(received).unwrap()
        });

        (base_url, handle)
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        body.len() >= content_length
    }

    fn provider_for(base_url: String) -> OpenAIProvider {
        OpenAIProvider::new(
            OpenAIConfigBuilder::new()
                .with_api_key("k1")
                .with_base_url(base_url)
                .build(),
        )
    }

    fn request() -> ModelRequest {
        ModelRequest {
            messages: vec![
                ModelMessage::System("You are X".to_owned()),
                ModelMessage::User("hello".to_owned()),
            ],
        }
    }

    #[tokio::test]
    async fn test_complete_over_http() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":"  hi \n"}}]}"#,
        )
        .await;

        let reply = provider_for(base_url).complete(&request()).await.unwrap();
        assert_eq!(reply, "hi");

        let received = server.await.unwrap();
        let lowered = received.to_ascii_lowercase();
        assert!(received.starts_with("POST /v1/chat/completions HTTP/1.1\r\n"));
        assert!(lowered.contains("authorization: bearer k1\r\n"));
        assert!(lowered.contains("content-type: application/json\r\n"));

        let (_, body) = received.split_once("\r\n\r\n").unwrap();
        let body: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hello");
    }

    #[tokio::test]
    async fn test_api_error_over_http() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized",
            r#"{"error":{"message":"bad key"}}"#,
        )
        .await;

        let err = provider_for(base_url).complete(&request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.to_string(), "API request failed (401): bad key");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_io() {
        // Nothing listens on this address; reaching the network would
        // produce a transport error instead.
        let config = OpenAIConfigBuilder::new()
            .with_api_key_env("PERSONA_CHAT_TEST_UNSET_API_KEY")
            .with_base_url("http://127.0.0.1:9")
            .build();
        let provider = OpenAIProvider::new(config);
        let req = ModelRequest {
            messages: vec![ModelMessage::User("hello".to_owned())],
        };
        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.status_code(), None);
    }
}
