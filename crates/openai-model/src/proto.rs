use persona_chat_model::{ErrorKind, ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

use crate::{Error, OpenAIConfig};

const TEMPERATURE: f32 = 0.7;

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System { content: String },
    User { content: String },
    Assistant { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        max_tokens: config.max_tokens,
        temperature: TEMPERATURE,
        stream: false,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::System(content) => Message::System {
            content: content.clone(),
        },
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
        ModelMessage::Assistant(content) => Message::Assistant {
            content: content.clone(),
        },
    }
}

/// Builds the error for a non-success response.
///
/// The body is expected to look like `{"error": {"message": "..."}}`, but
/// any other body is passed through as is.
pub fn api_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_owned());
    let message = if message.is_empty() {
        "unknown error".to_owned()
    } else {
        message
    };
    Error::api(status, message)
}

/// Extracts the trimmed content of the first choice from a success body.
pub fn extract_reply(body: &str) -> Result<String, Error> {
    let completion = serde_json::from_str::<ChatCompletion>(body).map_err(
        |err| {
            Error::new(
                format!("invalid response body: {err}"),
                ErrorKind::Transport,
            )
        },
    )?;
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "the API returned an empty response",
            ErrorKind::EmptyResponse,
        ));
    };
    let content = choice
        .message
        .and_then(|message| message.content)
        .map(|content| content.trim().to_owned())
        .unwrap_or_default();
    if content.is_empty() {
        return Err(Error::new(
            "the API returned a choice without content",
            ErrorKind::EmptyResponse,
        ));
    }
    Ok(content)
}
