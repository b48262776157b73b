//! Slash command parsing for the chat application.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to manage chats and modules without sending a question
//! to the service.

/// A parsed chat command.
///
/// These commands control the client and are not sent as questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// Start a new chat, optionally with a title.
    New(Option<String>),

    /// List chats.
    Chats,

    /// Make an existing chat the active one.
    Open(String),

    /// Delete a chat after confirmation.
    Delete(String),

    /// Show the module grid.
    Modules,

    /// Activate a module by id or 1-based position in the listing.
    Mount(String),

    /// Show a module's details by id or position.
    Inspect(String),

    /// Activate the module shown in the inspector.
    Activate,

    /// Close the inspector.
    Close,

    /// Upload a file into the active chat.
    Upload(String),

    /// Ask a one-off question outside the chat history.
    Ask(String),

    /// Show the citations of the last answer again.
    Sources,

    /// Switch between dark and light themes.
    Theme,

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a valid command,
/// or `None` if it should be treated as a regular message.
///
/// # Examples
///
/// ```
/// # use kovcheg::chat::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/mount 2").is_some());
/// assert!(parse_command("What does article 5 say?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let mut parts = rest.splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "new" => ChatCommand::New(argument.map(|s| s.to_string())),
        "chats" | "history" => ChatCommand::Chats,
        "open" => required(argument, ChatCommand::Open, "/open requires a chat id"),
        "delete" | "rm" => required(argument, ChatCommand::Delete, "/delete requires a chat id"),
        "modules" => ChatCommand::Modules,
        "mount" => required(
            argument,
            ChatCommand::Mount,
            "/mount requires a module id or number",
        ),
        "inspect" => required(
            argument,
            ChatCommand::Inspect,
            "/inspect requires a module id or number",
        ),
        "activate" => ChatCommand::Activate,
        "close" => ChatCommand::Close,
        "upload" => required(argument, ChatCommand::Upload, "/upload requires a file path"),
        "ask" => required(argument, ChatCommand::Ask, "/ask requires a question"),
        "sources" => ChatCommand::Sources,
        "theme" => ChatCommand::Theme,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn required<F>(argument: Option<&str>, constructor: F, missing: &str) -> ChatCommand
where
    F: Fn(String) -> ChatCommand,
{
    match argument {
        Some(arg) => constructor(arg.to_string()),
        None => ChatCommand::Invalid(missing.to_string()),
    }
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /new [title]           Start a new chat
  /chats                 List chats
  /open <id>             Continue an existing chat
  /delete <id>           Delete a chat
  /modules               Show installed modules
  /mount <id|n>          Scope answers to a module
  /inspect <id|n>        Show module details
  /activate              Mount the inspected module
  /close                 Close the module details
  /upload <path>         Ingest a file into the current chat
  /ask <question>        Ask once, outside the chat history
  /sources               Show the sources of the last answer
  /theme                 Toggle dark/light theme
  /help                  Show this help message
  /quit                  Exit the chat

Anything else is sent as a question. Ctrl+C stops a streaming answer."#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_quit_commands() {
        assert_eq!(parse_command("/quit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/exit"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("/q"), Some(ChatCommand::Quit));
        assert_eq!(parse_command("  /quit  "), Some(ChatCommand::Quit));
    }

    #[test]
    fn parse_new() {
        assert_eq!(parse_command("/new"), Some(ChatCommand::New(None)));
        assert_eq!(parse_command("/NEW"), Some(ChatCommand::New(None)));
        assert_eq!(
            parse_command("/new   Tax questions  "),
            Some(ChatCommand::New(Some("Tax questions".to_string())))
        );
    }

    #[test]
    fn parse_chat_management() {
        assert_eq!(parse_command("/chats"), Some(ChatCommand::Chats));
        assert_eq!(
            parse_command("/open 4f1c"),
            Some(ChatCommand::Open("4f1c".to_string()))
        );
        assert_eq!(
            parse_command("/delete 4f1c"),
            Some(ChatCommand::Delete("4f1c".to_string()))
        );
        assert_eq!(
            parse_command("/delete"),
            Some(ChatCommand::Invalid("/delete requires a chat id".to_string()))
        );
    }

    #[test]
    fn parse_module_commands() {
        assert_eq!(parse_command("/modules"), Some(ChatCommand::Modules));
        assert_eq!(
            parse_command("/mount 2"),
            Some(ChatCommand::Mount("2".to_string()))
        );
        assert_eq!(
            parse_command("/inspect civil_code"),
            Some(ChatCommand::Inspect("civil_code".to_string()))
        );
        assert_eq!(parse_command("/activate"), Some(ChatCommand::Activate));
        assert_eq!(parse_command("/close"), Some(ChatCommand::Close));
        assert!(matches!(
            parse_command("/mount"),
            Some(ChatCommand::Invalid(msg)) if msg.contains("requires")
        ));
    }

    #[test]
    fn parse_upload_and_ask() {
        assert_eq!(
            parse_command("/upload docs/contract final.pdf"),
            Some(ChatCommand::Upload("docs/contract final.pdf".to_string()))
        );
        assert_eq!(
            parse_command("/ask What is a lease?"),
            Some(ChatCommand::Ask("What is a lease?".to_string()))
        );
        assert!(matches!(
            parse_command("/ask   "),
            Some(ChatCommand::Invalid(msg)) if msg.contains("question")
        ));
    }

    #[test]
    fn parse_misc() {
        assert_eq!(parse_command("/sources"), Some(ChatCommand::Sources));
        assert_eq!(parse_command("/theme"), Some(ChatCommand::Theme));
        assert_eq!(parse_command("/?"), Some(ChatCommand::Help));
        assert_eq!(
            parse_command("/frobnicate"),
            Some(ChatCommand::Invalid("Unknown command: /frobnicate".to_string()))
        );
    }

    #[test]
    fn non_commands() {
        assert_eq!(parse_command("Hello, Kovcheg!"), None);
        assert_eq!(parse_command(""), None);
        assert_eq!(parse_command("  "), None);
    }

    #[test]
    fn help_text_not_empty() {
        let help = help_text();
        assert!(!help.is_empty());
        assert!(help.contains("/quit"));
        assert!(help.contains("/mount"));
        assert!(help.contains("/upload"));
        assert!(help.contains("/theme"));
    }
}
