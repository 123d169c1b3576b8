use thiserror::Error;

/// A user-correctable reason for rejecting an action. Nothing is appended
/// to the conversation when one of these is reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum ValidationError {
    #[error("please enter a message")]
    EmptyInput,

    #[error("the system prompt must not be empty")]
    EmptySystemPrompt,

    #[error("save a system prompt before sending messages")]
    MissingSystemPrompt,

    #[error("please wait for the previous message to finish")]
    Busy,
}
