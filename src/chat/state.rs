use crate::preferences::Theme;
use crate::types::{Citation, Message, Module};

/// Client-side state of one chat window.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Active chat, if any.
    pub session_id: Option<String>,
    pub session_title: Option<String>,
    /// Module answers are scoped to.
    pub active_module_id: Option<String>,
    pub theme: Theme,
    /// Module shown in the inspector.
    pub inspected_module: Option<Module>,
    /// Last successful module listing.
    pub modules: Vec<Module>,
    /// Displayed messages; a message's index is its view id.
    pub history: Vec<Message>,
    /// Citations of the most recent answer.
    pub citations: Vec<Citation>,
}

impl SessionState {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            ..Self::default()
        }
    }

    /// Looks a module up by id, or by its 1-based position in the listing.
    pub fn find_module(&self, selector: &str) -> Option<&Module> {
        if let Some(module) = self.modules.iter().find(|m| m.id == selector) {
            return Some(module);
        }
        let position: usize = selector.parse().ok()?;
        self.modules.get(position.checked_sub(1)?)
    }

    /// Forgets the active chat and everything displayed for it.
    pub fn clear_session(&mut self) {
        self.session_id = None;
        self.session_title = None;
        self.history.clear();
        self.citations.clear();
    }
}
