//! Display mode inference.
//!
//! The persona switches between three scenes. The mode is a cosmetic label
//! guessed from keywords in the latest assistant message; it is not
//! authoritative state.

use std::fmt::{self, Display};

const CLUB_KEYWORDS: &[&str] = &["俱乐部", "主宰", "呼吸", "银铐", "冰盘"];
const WORKPLACE_KEYWORDS: &[&str] = &["职场", "公司", "谢总", "经理", "项目"];
const PRIVATE_KEYWORDS: &[&str] = &["风暴", "空", "私人", "家", "静室"];

/// The scene the persona appears to be in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Nothing has been said yet.
    #[default]
    Unset,
    /// The club scene.
    Club,
    /// The workplace scene.
    Workplace,
    /// The private scene.
    Private,
    /// The last reply matched no keyword set.
    Unrecognized,
}

impl Mode {
    /// Classifies assistant content.
    ///
    /// Keyword sets are checked in a fixed order (club, workplace, then
    /// private) and the first set with any hit wins, regardless of what
    /// the later sets would match.
    pub fn classify(content: &str) -> Mode {
        let content = content.to_lowercase();
        let matches =
            |keywords: &[&str]| keywords.iter().any(|k| content.contains(k));
        if matches(CLUB_KEYWORDS) {
            Mode::Club
        } else if matches(WORKPLACE_KEYWORDS) {
            Mode::Workplace
        } else if matches(PRIVATE_KEYWORDS) {
            Mode::Private
        } else {
            Mode::Unrecognized
        }
    }

    /// Returns a short human-readable label.
    #[inline]
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Unset => "unset",
            Mode::Club => "club sovereign",
            Mode::Workplace => "workplace idol",
            Mode::Private => "private storm",
            Mode::Unrecognized => "unrecognized",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_category() {
        assert_eq!(Mode::classify("冰盘上的银铐。"), Mode::Club);
        assert_eq!(Mode::classify("谢总看了一眼项目。"), Mode::Workplace);
        assert_eq!(Mode::classify("静室里没有声音。"), Mode::Private);
        assert_eq!(Mode::classify("He looks away."), Mode::Unrecognized);
    }

    #[test]
    fn test_precedence() {
        // Workplace and private keywords come first in the text, but club
        // is checked first.
        assert_eq!(
            Mode::classify("公司楼下，他回到家，又去了俱乐部。"),
            Mode::Club
        );
        assert_eq!(Mode::classify("私人会议在公司召开。"), Mode::Workplace);
    }
}
