use persona_chat_model::ErrorKind;
use serde::{Deserialize, Serialize};

/// The preset outcome of an assistant step.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// The request succeeds with this text.
    #[serde(rename = "text")]
    Text(String),
    /// The request fails.
    #[serde(rename = "failure")]
    Failure(PresetFailure),
}

/// A failure returned in place of a reply.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetFailure {
    /// The kind of the failure.
    pub kind: ErrorKind,
    /// The HTTP status, for `Api` failures.
    pub status: Option<u16>,
    /// The error message.
    pub message: String,
}

impl PresetReply {
    /// Creates a successful reply.
    #[inline]
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::Text(text.into())
    }

    /// Creates a failure of the given kind.
    #[inline]
    pub fn failure<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        Self::Failure(PresetFailure {
            kind,
            status: None,
            message: message.into(),
        })
    }

    /// Creates an API failure with a status code.
    #[inline]
    pub fn api_failure<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Failure(PresetFailure {
            kind: ErrorKind::Api,
            status: Some(status),
            message: message.into(),
        })
    }
}
