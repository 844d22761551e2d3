#[cfg(test)]
#[path = "input_test.rs"]
mod tests;

pub const HELP: &str = r#"Commands:
    /new                    Start a new conversation
    /list                   List conversations, most recent first
    /select <n|id>          Switch to a conversation
    /rename <n|id> <title>  Rename a conversation
    /delete <n|id>          Delete a conversation
    /clear                  Remove all messages from the current conversation
    /retry                  Send the last question again
    /dismiss                Hide the current error
    /help                   Show this help
    /quit                   Exit
Anything else is sent as a message."#;

/// One line typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Prompt(String),
    New,
    List,
    Select(String),
    Rename(String, String),
    Delete(String),
    Clear,
    Retry,
    Dismiss,
    Help,
    Quit,
    /// A command that was not understood, with the reason.
    Invalid(String),
    Empty,
}

pub fn parse_line(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }

    let Some(command) = trimmed.strip_prefix('/') else {
        return Input::Prompt(line.trim_end_matches(['\r', '\n']).to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "new" => Input::New,
        "list" | "ls" => Input::List,
        "clear" => Input::Clear,
        "retry" => Input::Retry,
        "dismiss" => Input::Dismiss,
        "help" | "?" => Input::Help,
        "quit" | "exit" | "q" => Input::Quit,
        "select" | "open" => match rest {
            "" => Input::Invalid("usage: /select <n|id>".to_string()),
            target => Input::Select(target.to_string()),
        },
        "delete" | "rm" => match rest {
            "" => Input::Invalid("usage: /delete <n|id>".to_string()),
            target => Input::Delete(target.to_string()),
        },
        "rename" => match rest.split_once(char::is_whitespace) {
            Some((target, title)) if !title.trim().is_empty() => {
                Input::Rename(target.to_string(), title.trim().to_string())
            }
            _ => Input::Invalid("usage: /rename <n|id> <title>".to_string()),
        },
        other => Input::Invalid(format!("unknown command /{}, try /help", other)),
    }
}

/// Answers to a yes/no question default to no.
pub fn is_confirmed(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
