//! Interactive terminal client for the Kovcheg module chat service.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a local service
//! kovcheg-chat
//!
//! # Point at another deployment
//! kovcheg-chat --base-url http://ark.local:8000/api/v1/
//!
//! # Disable colors and log every request to stderr
//! kovcheg-chat --no-color --verbose
//! ```
//!
//! Anything typed that is not a slash command is sent as a question into the
//! active chat. Ctrl+C while an answer streams stops it; `/help` lists the
//! commands.

use std::sync::Arc;

use arrrg::CommandLine;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use kovcheg::chat::{
    ChatArgs, ChatCommand, ChatConfig, ChatController, TerminalView, TurnOutcome, ViewName,
    help_text, parse_command,
};
use kovcheg::{Error, FilePreferences, Kovcheg, Result as KovchegResult, StderrLogger};

type Controller = ChatController<Kovcheg, TerminalView>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("kovcheg-chat [OPTIONS]");
    let config = ChatConfig::from(args);

    let mut client = Kovcheg::with_options(config.base_url.clone(), Some(config.timeout))?;
    if config.verbose {
        client = client.with_logger(Arc::new(StderrLogger));
    }
    let base_url = client.base_url().to_string();
    let view = TerminalView::with_color(config.use_color);
    let preferences = FilePreferences::new(&config.preferences_path);
    let controller = ChatController::new(client, view, Box::new(preferences));

    // Ctrl+C stops the answer being streamed; at the prompt rustyline sees it.
    let pending = controller.pending_handle();
    ctrlc::set_handler(move || {
        pending.cancel();
    })?;

    println!("Kovcheg terminal ({base_url})");
    println!("Type /help for commands, /quit to exit\n");
    // Failures are already on screen.
    let _ = controller.start().await;

    let mut rl = DefaultEditor::new()?;
    loop {
        let readline = rl.readline("you> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(cmd) = parse_command(line) {
                    if !run_command(&controller, cmd).await {
                        println!("Goodbye!");
                        break;
                    }
                    continue;
                }

                match controller.send_message(line).await {
                    Ok(TurnOutcome::Cancelled) => info(&controller, "Answer stopped."),
                    Ok(_) => {}
                    Err(err) if unreported(&err) => error(&controller, &err.to_string()),
                    Err(_) => {}
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                error(&controller, &format!("Input error: {err}"));
                break;
            }
        }
    }

    Ok(())
}

/// Runs one slash command. Returns false when the user asked to quit.
async fn run_command(controller: &Controller, cmd: ChatCommand) -> bool {
    match cmd {
        ChatCommand::Quit => return false,
        ChatCommand::Help => {
            for line in help_text().lines() {
                println!("    {line}");
            }
        }
        // Session and listing failures are reported as toasts by the controller.
        ChatCommand::New(title) => {
            let _ = controller.create_session(title.as_deref()).await;
        }
        ChatCommand::Chats => {
            let _ = controller.list_sessions().await;
        }
        ChatCommand::Open(id) => {
            let _ = controller.open_session(&id).await;
        }
        ChatCommand::Delete(id) => {
            if let Ok(false) = controller.delete_session(&id).await {
                info(controller, "Kept the chat.");
            }
        }
        ChatCommand::Modules => {
            if controller.load_modules().await.is_ok() {
                controller.switch_view(ViewName::Modules);
            }
        }
        ChatCommand::Mount(selector) => {
            report(controller, controller.mount(&selector).await);
        }
        ChatCommand::Inspect(selector) => {
            report(controller, controller.open_inspector(&selector));
        }
        ChatCommand::Activate => {
            if !controller.activate_inspected().await {
                info(controller, "No module is being inspected; use /inspect first.");
            }
        }
        ChatCommand::Close => controller.close_inspector(),
        // Upload and ask failures land in the chat history.
        ChatCommand::Upload(path) => {
            match controller.upload_file(&path).await {
                Err(err) if err.is_validation() => error(controller, &err.to_string()),
                _ => {}
            }
        }
        ChatCommand::Ask(question) => {
            match controller.ask_once(&question).await {
                Err(err) if err.is_validation() => error(controller, &err.to_string()),
                _ => {}
            }
        }
        ChatCommand::Sources => {
            controller.show_citations();
        }
        ChatCommand::Theme => {
            let theme = controller.toggle_theme();
            info(controller, &format!("Theme set to {theme}."));
        }
        ChatCommand::Invalid(message) => error(controller, &message),
    }
    true
}

fn report<T>(controller: &Controller, result: KovchegResult<T>) {
    if let Err(err) = result {
        error(controller, &err.to_string());
    }
}

/// Whether a failed send still needs printing. Network failures of a send
/// come from creating its chat, which the controller shows as a toast.
fn unreported(err: &Error) -> bool {
    !err.is_network()
}

fn info(controller: &Controller, message: &str) {
    controller.with_view(|view| view.print_info(message));
}

fn error(controller: &Controller, message: &str) {
    controller.with_view(|view| view.print_error(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_validation_failures_are_printed() {
        assert!(unreported(&Error::validation("query must not be empty", None)));
        assert!(!unreported(&Error::internal_server("database locked")));
        assert!(!unreported(&Error::connection("refused", None)));
    }
}
