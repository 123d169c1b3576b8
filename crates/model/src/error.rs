use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No usable credential was configured. Reported before any network
    /// I/O happens.
    Configuration,
    /// The endpoint answered with a non-success status.
    Api,
    /// The endpoint answered successfully but without any usable choice.
    EmptyResponse,
    /// The request could not be delivered or the response could not be
    /// read.
    Transport,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "Configuration error"),
            ErrorKind::Api => write!(f, "API error"),
            ErrorKind::EmptyResponse => write!(f, "Empty response"),
            ErrorKind::Transport => write!(f, "Transport error"),
        }
    }
}
