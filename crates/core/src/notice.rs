use std::fmt::{self, Display};

/// Severity of a [`Notice`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient message for the user that is not part of the conversation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Notice {
    level: NoticeLevel,
    text: String,
}

impl Notice {
    #[inline]
    pub fn new<S: Into<String>>(level: NoticeLevel, text: S) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }

    #[inline]
    pub fn success<S: Into<String>>(text: S) -> Self {
        Self::new(NoticeLevel::Success, text)
    }

    #[inline]
    pub fn info<S: Into<String>>(text: S) -> Self {
        Self::new(NoticeLevel::Info, text)
    }

    #[inline]
    pub fn warning<S: Into<String>>(text: S) -> Self {
        Self::new(NoticeLevel::Warning, text)
    }

    #[inline]
    pub fn error<S: Into<String>>(text: S) -> Self {
        Self::new(NoticeLevel::Error, text)
    }

    #[inline]
    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
