//! Terminal rendering of messages and notices.

use owo_colors::OwoColorize;
use persona_chat_core::conversation::{Message, Role};
use persona_chat_core::notice::{Notice, NoticeLevel};
use persona_chat_core::persona::PERSONA_NAME;

pub const BAR_CHAR: &str = "▎";

const ASIDE_OPENERS: [char; 2] = ['（', '('];
const ASIDE_CLOSERS: [char; 2] = ['）', ')'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Speech,
    /// Bracketed narration, brackets included.
    Aside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

/// Splits `text` into speech and bracketed asides.
///
/// Brackets do not nest, and an aside left open runs to the end.
pub fn split_asides(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_aside = false;
    for (idx, ch) in text.char_indices() {
        if !in_aside && ASIDE_OPENERS.contains(&ch) {
            push_segment(&mut segments, SegmentKind::Speech, &text[start..idx]);
            start = idx;
            in_aside = true;
        } else if in_aside && ASIDE_CLOSERS.contains(&ch) {
            let end = idx + ch.len_utf8();
            push_segment(&mut segments, SegmentKind::Aside, &text[start..end]);
            start = end;
            in_aside = false;
        }
    }
    let kind = if in_aside {
        SegmentKind::Aside
    } else {
        SegmentKind::Speech
    };
    push_segment(&mut segments, kind, &text[start..]);

    segments
}

#[inline]
fn push_segment<'a>(
    segments: &mut Vec<Segment<'a>>,
    kind: SegmentKind,
    text: &'a str,
) {
    if !text.is_empty() {
        segments.push(Segment { kind, text });
    }
}

/// Renders message content with asides dimmed and the persona name
/// highlighted.
pub fn render_content(content: &str) -> String {
    let name = PERSONA_NAME.bright_magenta().bold().to_string();
    split_asides(content)
        .into_iter()
        .map(|segment| match segment.kind {
            SegmentKind::Aside => segment.text.dimmed().to_string(),
            SegmentKind::Speech => segment
                .text
                .split(PERSONA_NAME)
                .map(|part| part.bright_white().to_string())
                .collect::<Vec<_>>()
                .join(&name),
        })
        .collect()
}

pub fn render_message(message: &Message) -> String {
    let content = render_content(message.content());
    match message.role() {
        Role::User => {
            format!("{}{} {content}", BAR_CHAR.bright_green(), "you".bright_green())
        }
        Role::Assistant => format!(
            "{}{} {content}",
            BAR_CHAR.bright_cyan(),
            PERSONA_NAME.bright_cyan().bold()
        ),
        Role::System => format!("{}{content}", BAR_CHAR.bright_black()),
    }
}

/// Echoes text the REPL sends on the user's behalf, such as an aside or
/// a scene opener.
#[inline]
pub fn render_outgoing(text: &str) -> String {
    render_message(&Message::user(text))
}

pub fn render_notice(notice: &Notice) -> String {
    let text = notice.text();
    match notice.level() {
        NoticeLevel::Success => format!("{} {text}", "✔".bright_green()),
        NoticeLevel::Info => format!("{} {text}", "ℹ".bright_blue()),
        NoticeLevel::Warning => format!("{} {}", "⚠️".bright_yellow(), text.yellow()),
        NoticeLevel::Error => format!("{} {}", "✘".bright_red(), text.red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds<'a>(segments: &[Segment<'a>]) -> Vec<(SegmentKind, &'a str)> {
        segments.iter().map(|s| (s.kind, s.text)).collect()
    }

    #[test]
    fn test_split_asides() {
        use SegmentKind::*;

        assert_eq!(
            kinds(&split_asides("坐下。（他看向窗外）说吧。")),
            [(Speech, "坐下。"), (Aside, "（他看向窗外）"), (Speech, "说吧。")]
        );
        assert_eq!(
            kinds(&split_asides("(mixed）tail")),
            [(Aside, "(mixed）"), (Speech, "tail")]
        );
        assert_eq!(
            kinds(&split_asides("open（never closed")),
            [(Speech, "open"), (Aside, "（never closed")]
        );
        assert!(split_asides("").is_empty());
    }

    #[test]
    fn test_render_content() {
        let rendered = render_content("谢屿说。（他笑）");
        assert!(rendered.contains("\u{1b}[2m（他笑）"));
        assert!(rendered.contains(PERSONA_NAME));
        assert!(rendered.contains("说。"));
    }

    #[test]
    fn test_render_outgoing_aside() {
        let rendered = render_outgoing("（他看向窗外）");
        assert!(rendered.contains("you"));
        assert!(rendered.contains("\u{1b}[2m（他看向窗外）"));
    }

    #[test]
    fn test_render_message_labels() {
        let rendered = render_message(&Message::assistant("hi"));
        assert!(rendered.contains(PERSONA_NAME));
        assert!(rendered.contains("hi"));

        let rendered = render_message(&Message::user("hello"));
        assert!(rendered.contains("you"));
    }
}
