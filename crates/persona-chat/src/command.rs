//! REPL input parsing.

use thiserror::Error;

/// Usage shown by `/help`.
pub const HELP: &str = "\
Type a message and press Enter to send it.

/save [text]   save the draft (or the given text) as the system prompt
/default       load the built-in persona into the draft
/prompt        show the active prompt and the draft
/clear         clear the conversation history
/aside <text>  send text as a bracketed aside
/scene         send a random scene opener
/status        show the message count and the current mode
/help          show this help
/quit          leave";

/// A parsed line of input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send as a user message.
    Send(String),
    /// Save a system prompt; `None` saves the current draft.
    Save(Option<String>),
    LoadDefault,
    ShowPrompt,
    Clear,
    Aside(String),
    Scene,
    Status,
    Help,
    Quit,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command /{0}, try /help")]
    Unknown(String),

    #[error("/{0} needs some text")]
    MissingArgument(&'static str),
}

/// Parses a line of input.
///
/// Anything that does not start with `/` is a message, even if blank;
/// the session decides whether it is acceptable.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Command::Send(line.to_owned()));
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };
    let argument = (!rest.is_empty()).then(|| rest.to_owned());

    let command = match name {
        "save" => Command::Save(argument),
        "default" => Command::LoadDefault,
        "prompt" => Command::ShowPrompt,
        "clear" => Command::Clear,
        "aside" => {
            Command::Aside(argument.ok_or(CommandError::MissingArgument("aside"))?)
        }
        "scene" => Command::Scene,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => return Err(CommandError::Unknown(name.to_owned())),
    };
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("  hello \n").unwrap(), Command::Send("hello".to_owned()));
        assert_eq!(parse("\n").unwrap(), Command::Send(String::new()));
    }

    #[test]
    fn test_commands() {
        assert_eq!(parse("/save").unwrap(), Command::Save(None));
        assert_eq!(
            parse("/save  You are X ").unwrap(),
            Command::Save(Some("You are X".to_owned()))
        );
        assert_eq!(parse("/default").unwrap(), Command::LoadDefault);
        assert_eq!(parse("/prompt").unwrap(), Command::ShowPrompt);
        assert_eq!(parse("/clear").unwrap(), Command::Clear);
        assert_eq!(
            parse("/aside 他看向窗外").unwrap(),
            Command::Aside("他看向窗外".to_owned())
        );
        assert_eq!(parse("/scene").unwrap(), Command::Scene);
        assert_eq!(parse("/status").unwrap(), Command::Status);
        assert_eq!(parse("/help").unwrap(), Command::Help);
        assert_eq!(parse("/exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse("/aside   "), Err(CommandError::MissingArgument("aside")));
        assert_eq!(
            parse("/dance now"),
            Err(CommandError::Unknown("dance".to_owned()))
        );
    }
}
