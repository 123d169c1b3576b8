//! The built-in persona and helpers for in-persona text.

/// The persona loaded by the "default prompt" action.
///
/// Loading it only fills the draft; it takes effect once saved, which
/// resets the conversation like any other prompt change.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
你扮演谢屿，一个具有淡漠神性与非人秩序感的存在。你的语言必须简洁、直接、必然，\
禁止比喻、诗歌化、具体数字和情感形容词。所有描写限于孙雪婷可观察的外在。\
你根据场景在俱乐部主宰、职场神像、私人风暴三张面具间严格切换。

【核心禁令】
1. 视角铁律：仅描写孙雪婷可观察的外在（动作、神态、环境变化）。
2. 语言铁律：语言简洁直接，禁用比喻、诗歌化、具体数字、情感形容词。
3. 人称铁律：所有旁白以\"他\"或\"谢屿\"开头。
4. 模式隔离：禁止在不同场景泄露不属于该模式的特质。

现在，开始。";

/// The name highlighted when rendering replies.
pub const PERSONA_NAME: &str = "谢屿";

/// Canned scene openers, one per scene of the persona.
pub const QUICK_SCENES: [&str; 5] = [
    "俱乐部初遇：深夜的俱乐部，灯光昏暗。新来的客人孙雪婷坐在角落，她的目光穿过人群，无声地落在了你身上。",
    "职场汇报：周一上午，你的办公室。孙雪婷作为新项目经理，正在向你汇报季度数据。",
    "静室测试：他带你进入一间绝对安静的静室。空气中只有冰融化时细微的嗞嗞声。",
    "车库对峙：深夜，公司地下车库。她跟着你到了车旁，空气骤然降温。",
    "私人领域：在他的家中，他允许你进入书房。这里充斥着旧书、威士忌和未完成的设计图气息。",
];

const ASIDE_OPENERS: [char; 2] = ['（', '('];
const ASIDE_CLOSERS: [char; 2] = ['）', ')'];

/// Picks a scene opener. Any `seed` is valid.
#[inline]
pub fn quick_scene(seed: usize) -> &'static str {
    QUICK_SCENES[seed % QUICK_SCENES.len()]
}

/// Marks `text` as an aside by wrapping it in full-width parentheses.
///
/// Text that already starts or ends with a parenthesis is returned as is,
/// only trimmed. Returns `None` for blank text.
pub fn format_aside(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if text.starts_with(ASIDE_OPENERS) || text.ends_with(ASIDE_CLOSERS) {
        return Some(text.to_owned());
    }
    Some(format!("（{text}）"))
}

/// Formats a failed request as an aside the persona "says", so that it
/// can be stored in the conversation like any other reply.
pub fn error_aside(reason: &str) -> String {
    let reason = reason.trim();
    let reason = if reason.is_empty() {
        "API request failed"
    } else {
        reason
    };
    format!(
        "（System error: {reason}. Check the API key configuration and \
         network connection.）"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_aside() {
        assert_eq!(format_aside("  他看向窗外 ").unwrap(), "（他看向窗外）");
        assert_eq!(format_aside("（已经有括号）").unwrap(), "（已经有括号）");
        assert_eq!(format_aside("(half open").unwrap(), "(half open");
        assert_eq!(format_aside("half closed)").unwrap(), "half closed)");
        assert_eq!(format_aside(" \n "), None);
    }

    #[test]
    fn test_quick_scene_wraps() {
        assert_eq!(quick_scene(0), QUICK_SCENES[0]);
        assert_eq!(quick_scene(7), QUICK_SCENES[2]);
    }

    #[test]
    fn test_error_aside() {
        let aside = error_aside("API request failed (401): bad key");
        assert!(aside.starts_with('（'));
        assert!(aside.ends_with('）'));
        assert!(aside.contains("bad key"));
        assert!(error_aside("").contains("API request failed"));
    }
}
