//! Output rendering for the chat client.
//!
//! [`View`] is everything the controller can change on screen. The
//! [`TerminalView`] here writes to stdout with optional ANSI styling;
//! [`HtmlView`](crate::markup::HtmlView) produces escaped HTML fragments.

use std::io::{self, BufRead, Stdout, Write};

use crate::preferences::Theme;
use crate::types::{ChatSummary, Citation, Module, Role};

/// ANSI escape code for dim text (used for citations and metadata).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for titles).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (system accent on dark terminals).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for blue text (system accent on light terminals).
const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for green text (used for verified badges).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for toasts).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Titles longer than this are shortened in the sidebar.
pub const SIDEBAR_TITLE_LIMIT: usize = 22;

/// Characters kept from a shortened sidebar title.
const SIDEBAR_TITLE_KEEP: usize = 20;

/// Position of a message in the displayed history.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub usize);

/// Top-level screens.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViewName {
    Chat,
    Modules,
}

/// Everything the controller can change on screen.
///
/// Implementations receive raw, unescaped text and are responsible for
/// making it safe for their medium.
pub trait View: Send {
    /// Fill the module grid with full-detail cards.
    fn render_module_grid(&mut self, modules: &[Module]);

    /// Fill the sidebar with one compact entry per module.
    fn render_module_sidebar(&mut self, modules: &[Module]);

    /// Show that the listing succeeded but holds no modules.
    fn render_modules_empty(&mut self);

    /// Show that the listing could not be fetched.
    fn render_modules_error(&mut self, error: &str);

    /// Highlight one sidebar entry and clear the others.
    fn mark_active_module(&mut self, module_id: &str);

    /// Show which module answers are scoped to.
    fn set_module_indicator(&mut self, title: &str);

    /// Show the chat listing.
    fn render_sessions(&mut self, sessions: &[ChatSummary], active: Option<&str>);

    /// Show the active chat title, or reset the indicator.
    fn set_session_title(&mut self, title: Option<&str>);

    /// Remove every displayed message.
    fn clear_history(&mut self);

    /// Display a complete message.
    fn append_message(&mut self, id: MessageId, role: Role, text: &str);

    /// Display an empty reply with a typing indicator.
    fn begin_reply(&mut self, id: MessageId);

    /// Replace the text of a displayed message.
    ///
    /// During streaming this is called with the whole answer so far, not
    /// the newest fragment.
    fn update_message(&mut self, id: MessageId, text: &str);

    /// Replace the citation panel contents and reveal it.
    fn render_citations(&mut self, citations: &[Citation]);

    /// Hide the citation panel.
    fn hide_citations(&mut self);

    /// Show a transient notice.
    fn show_toast(&mut self, message: &str, is_error: bool);

    /// Enable or disable the input line.
    fn set_input_enabled(&mut self, enabled: bool);

    fn focus_input(&mut self) {}

    fn scroll_to_bottom(&mut self) {}

    /// Show the detail panel for a module.
    fn open_inspector(&mut self, module: &Module);

    /// Hide the detail panel.
    fn close_inspector(&mut self);

    /// Restyle for a theme.
    fn apply_theme(&mut self, theme: Theme);

    /// Bring a screen to the front.
    fn switch_view(&mut self, view: ViewName);

    /// Ask the user a yes/no question.
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Sidebar label for a module title.
///
/// Titles over [`SIDEBAR_TITLE_LIMIT`] characters keep their first 20
/// characters followed by `..`.
pub fn sidebar_label(title: &str) -> String {
    if title.chars().count() > SIDEBAR_TITLE_LIMIT {
        let kept: String = title.chars().take(SIDEBAR_TITLE_KEEP).collect();
        format!("{kept}..")
    } else {
        title.to_string()
    }
}

/// Badge text for a module's signature state.
pub fn badge_label(verified: bool) -> &'static str {
    if verified { "Verified" } else { "Unsigned" }
}

/// Strips control characters other than newline and tab.
///
/// Keeps server text from moving the cursor or injecting escape sequences.
pub fn sanitize_terminal(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Plain text view with optional ANSI styling.
pub struct TerminalView {
    stdout: Stdout,
    use_color: bool,
    theme: Theme,
    grid: Vec<String>,
    // Reply currently streaming and the text already printed for it.
    open_reply: Option<(MessageId, String)>,
    // Reply of the turn in progress; survives other output interrupting it.
    streaming: Option<MessageId>,
}

impl TerminalView {
    /// Creates a new TerminalView with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new TerminalView with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            theme: Theme::default(),
            grid: Vec::new(),
            open_reply: None,
            streaming: None,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn accent(&self) -> &'static str {
        match self.theme {
            Theme::Dark => ANSI_CYAN,
            Theme::Light => ANSI_BLUE,
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    /// Prints an informational line outside the chat history.
    pub fn print_info(&self, message: &str) {
        println!("{}", self.styled(ANSI_DIM, &sanitize_terminal(message)));
    }

    /// Prints an error line to stderr.
    pub fn print_error(&self, message: &str) {
        let line = format!("Error: {}", sanitize_terminal(message));
        eprintln!("{}", self.styled(ANSI_RED, &line));
    }

    fn prefix(&self, role: Role) -> String {
        match role {
            Role::User => self.styled(ANSI_BOLD, "you>"),
            Role::System => self.styled(self.accent(), "kovcheg>"),
        }
    }

    fn close_reply(&mut self) {
        if self.open_reply.take().is_some() {
            println!();
            self.flush();
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl View for TerminalView {
    fn render_module_grid(&mut self, modules: &[Module]) {
        self.grid = modules
            .iter()
            .enumerate()
            .map(|(index, module)| {
                let badge = if module.verified {
                    self.styled(ANSI_GREEN, badge_label(true))
                } else {
                    self.styled(ANSI_YELLOW, badge_label(false))
                };
                let meta = format!(
                    "{} | v{} | id {}",
                    sanitize_terminal(&module.size),
                    sanitize_terminal(&module.version),
                    sanitize_terminal(&module.id),
                );
                format!(
                    "{:>3}. {} [{badge}]\n     {}\n     {}",
                    index + 1,
                    self.styled(ANSI_BOLD, &sanitize_terminal(&module.title)),
                    sanitize_terminal(&module.description),
                    self.styled(ANSI_DIM, &meta),
                )
            })
            .collect();
    }

    fn render_module_sidebar(&mut self, modules: &[Module]) {
        self.close_reply();
        let labels: Vec<String> = modules
            .iter()
            .map(|module| sanitize_terminal(&sidebar_label(&module.title)))
            .collect();
        println!("modules: {}", labels.join(", "));
        self.flush();
    }

    fn render_modules_empty(&mut self) {
        self.close_reply();
        self.grid.clear();
        println!("{}", self.styled(ANSI_DIM, "No modules installed."));
    }

    fn render_modules_error(&mut self, error: &str) {
        self.close_reply();
        self.grid.clear();
        let line = format!("Module listing failed: {}", sanitize_terminal(error));
        eprintln!("{}", self.styled(ANSI_RED, &line));
    }

    fn mark_active_module(&mut self, _module_id: &str) {}

    fn set_module_indicator(&mut self, title: &str) {
        self.close_reply();
        let line = format!("[module: {}]", sanitize_terminal(title));
        println!("{}", self.styled(self.accent(), &line));
    }

    fn render_sessions(&mut self, sessions: &[ChatSummary], active: Option<&str>) {
        self.close_reply();
        if sessions.is_empty() {
            println!("{}", self.styled(ANSI_DIM, "No chats yet."));
            return;
        }
        for session in sessions {
            let marker = if active == Some(session.id.as_str()) { "*" } else { " " };
            println!(
                "{marker} {}  {}",
                self.styled(ANSI_DIM, &sanitize_terminal(&session.id)),
                sanitize_terminal(&session.title),
            );
        }
        self.flush();
    }

    fn set_session_title(&mut self, title: Option<&str>) {
        self.close_reply();
        match title {
            Some(title) => {
                let line = format!("== {} ==", sanitize_terminal(title));
                println!("{}", self.styled(ANSI_BOLD, &line));
            }
            None => println!("{}", self.styled(ANSI_DIM, "== no active chat ==")),
        }
    }

    fn clear_history(&mut self) {
        self.open_reply = None;
        self.streaming = None;
        println!();
    }

    fn append_message(&mut self, _id: MessageId, role: Role, text: &str) {
        self.close_reply();
        println!("{} {}", self.prefix(role), sanitize_terminal(text));
        self.flush();
    }

    fn begin_reply(&mut self, id: MessageId) {
        self.close_reply();
        print!("{} ", self.prefix(Role::System));
        self.open_reply = Some((id, String::new()));
        self.streaming = Some(id);
        self.flush();
    }

    fn update_message(&mut self, id: MessageId, text: &str) {
        let text = sanitize_terminal(text);
        match self.open_reply.take() {
            Some((open, printed)) if open == id => {
                if let Some(delta) = text.strip_prefix(printed.as_str()) {
                    print!("{delta}");
                } else {
                    // The reply was replaced rather than extended.
                    println!();
                    print!("{} {text}", self.prefix(Role::System));
                }
                self.open_reply = Some((id, text));
            }
            other => {
                self.open_reply = other;
                self.close_reply();
                if self.streaming == Some(id) {
                    // Resume the reply after citations or a toast cut in.
                    print!("{} {text}", self.prefix(Role::System));
                    self.open_reply = Some((id, text));
                } else {
                    println!("{} {text}", self.prefix(Role::System));
                }
            }
        }
        self.flush();
    }

    fn render_citations(&mut self, citations: &[Citation]) {
        self.close_reply();
        for (index, citation) in citations.iter().enumerate() {
            let heading = format!("Source #{} ({}%)", index + 1, citation.percent());
            println!("{}", self.styled(self.accent(), &heading));
            println!("{}", self.styled(ANSI_DIM, &sanitize_terminal(&citation.chunk)));
        }
        self.flush();
    }

    fn hide_citations(&mut self) {}

    fn show_toast(&mut self, message: &str, is_error: bool) {
        self.close_reply();
        let message = sanitize_terminal(message);
        if is_error {
            eprintln!("{}", self.styled(ANSI_RED, &format!("! {message}")));
        } else {
            println!("{}", self.styled(ANSI_YELLOW, &format!("* {message}")));
        }
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        if enabled {
            self.close_reply();
            self.streaming = None;
        }
    }

    fn open_inspector(&mut self, module: &Module) {
        self.close_reply();
        println!("{}", self.styled(ANSI_BOLD, &sanitize_terminal(&module.title)));
        println!("  id:          {}", sanitize_terminal(&module.id));
        println!("  version:     {}", sanitize_terminal(&module.version));
        println!("  size:        {}", sanitize_terminal(&module.size));
        println!("  signature:   {}", badge_label(module.verified));
        println!("  description: {}", sanitize_terminal(&module.description));
        println!("{}", self.styled(ANSI_DIM, "/activate to mount, /close to dismiss"));
        self.flush();
    }

    fn close_inspector(&mut self) {}

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn switch_view(&mut self, view: ViewName) {
        self.close_reply();
        if view == ViewName::Modules {
            for card in &self.grid {
                println!("{card}");
            }
            self.flush();
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.close_reply();
        print!("{} [y/N] ", sanitize_terminal(prompt));
        self.flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_default_has_color() {
        let view = TerminalView::new();
        assert!(view.use_color);
    }

    #[test]
    fn view_without_color() {
        let view = TerminalView::with_color(false);
        assert!(!view.use_color);
        assert_eq!(view.styled(ANSI_RED, "plain"), "plain");
    }

    #[test]
    fn sidebar_truncates_long_titles() {
        assert_eq!(sidebar_label("Short title"), "Short title");
        assert_eq!(sidebar_label("Exactly twenty-two ch."), "Exactly twenty-two ch.");
        assert_eq!(
            sidebar_label("Constitution and Civil Code"),
            "Constitution and Civ.."
        );
        assert_eq!(
            sidebar_label("Конституція та Цивільний кодекс"),
            "Конституція та Цивіл.."
        );
    }

    #[test]
    fn badges() {
        assert_eq!(badge_label(true), "Verified");
        assert_eq!(badge_label(false), "Unsigned");
    }

    #[test]
    fn sanitize_strips_escape_sequences() {
        assert_eq!(sanitize_terminal("a\x1b[31mb\r\nc\td"), "a[31mb\nc\td");
    }

    #[test]
    fn theme_changes_accent() {
        let mut view = TerminalView::new();
        assert_eq!(view.accent(), ANSI_CYAN);
        view.apply_theme(Theme::Light);
        assert_eq!(view.accent(), ANSI_BLUE);
    }

    #[test]
    fn grid_is_cached_for_the_modules_view() {
        let mut view = TerminalView::with_color(false);
        let module = Module::normalize(crate::types::ModuleRecord::new("m1"));
        view.render_module_grid(std::slice::from_ref(&module));
        assert_eq!(view.grid.len(), 1);
        assert!(view.grid[0].contains("Untitled Module [Unsigned]"));
        assert!(view.grid[0].contains("Unknown | v1.0 | id m1"));

        view.render_modules_empty();
        assert!(view.grid.is_empty());
    }

    #[test]
    fn streaming_reply_tracks_printed_prefix() {
        let mut view = TerminalView::with_color(false);
        view.begin_reply(MessageId(1));
        view.update_message(MessageId(1), "Hel");
        view.update_message(MessageId(1), "Hello");
        assert_eq!(view.open_reply, Some((MessageId(1), "Hello".to_string())));

        view.update_message(MessageId(1), "Connection error: reset");
        assert_eq!(
            view.open_reply,
            Some((MessageId(1), "Connection error: reset".to_string()))
        );

        view.set_input_enabled(true);
        assert!(view.open_reply.is_none());
    }

    #[test]
    fn sources_before_tokens_keep_one_reply() {
        let mut view = TerminalView::with_color(false);
        view.begin_reply(MessageId(2));
        view.render_citations(&[Citation::new("Article 5", 0.9)]);
        assert!(view.open_reply.is_none());

        view.update_message(MessageId(2), "Hel");
        assert_eq!(view.open_reply, Some((MessageId(2), "Hel".to_string())));
        view.update_message(MessageId(2), "Hello");
        assert_eq!(view.open_reply, Some((MessageId(2), "Hello".to_string())));

        view.set_input_enabled(true);
        assert!(view.open_reply.is_none());
        assert!(view.streaming.is_none());
    }

    #[test]
    fn finished_replies_are_reprinted_whole() {
        let mut view = TerminalView::with_color(false);
        view.begin_reply(MessageId(1));
        view.update_message(MessageId(1), "done");
        view.set_input_enabled(true);

        view.update_message(MessageId(0), "File a.txt integrated");
        assert!(view.open_reply.is_none());
    }
}
