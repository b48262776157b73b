//! HTML fragments for embedders that render into a page.
//!
//! Every piece of server-provided text passes through [`escape_html`] before
//! it lands in markup. [`HtmlView`] keeps the fragments as a small document
//! model that can be inspected after each controller operation.

use crate::preferences::Theme;
use crate::render::{MessageId, View, ViewName, badge_label, sidebar_label};
use crate::types::{ChatSummary, Citation, Module, Role};

/// Shown inside a reply until the first token arrives.
pub const TYPING_CURSOR: &str = r#"<span class="typing-cursor">▋</span>"#;

/// Escapes the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes text and turns newlines into line breaks.
pub fn format_text(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

fn badge(verified: bool) -> String {
    let class = if verified { "verified" } else { "unsigned" };
    format!(r#"<span class="badge {class}">{}</span>"#, badge_label(verified))
}

/// Full-detail card for the module grid.
pub fn module_card(module: &Module) -> String {
    let id = escape_html(&module.id);
    format!(
        concat!(
            r#"<div class="pkg-card" data-id="{id}">"#,
            r#"<div class="pkg-header"><div class="pkg-title">{title}</div>{badge}</div>"#,
            r#"<div class="pkg-meta">{description}</div>"#,
            r#"<div class="pkg-footer"><span class="pkg-size">{size}</span>"#,
            r#"<span class="pkg-version">v{version}</span>"#,
            r#"<button class="btn-secondary" data-id="{id}">MOUNT</button></div>"#,
            "</div>"
        ),
        id = id,
        title = escape_html(&module.title),
        badge = badge(module.verified),
        description = escape_html(&module.description),
        size = escape_html(&module.size),
        version = escape_html(&module.version),
    )
}

/// Compact sidebar entry; long titles are shortened.
pub fn sidebar_item(module: &Module, active: bool) -> String {
    let class = if active {
        "nav-item module-item active"
    } else {
        "nav-item module-item"
    };
    format!(
        r#"<button class="{class}" data-id="{}"><span>{}</span><div class="module-status-icon" title="{}"></div></button>"#,
        escape_html(&module.id),
        escape_html(&sidebar_label(&module.title)),
        badge_label(module.verified),
    )
}

/// Chat bubble around already formatted content.
pub fn message_bubble(role: Role, inner_html: &str) -> String {
    format!(r#"<div class="msg {role}"><div class="msg-bubble">{inner_html}</div></div>"#)
}

/// Citation panel contents.
pub fn citation_list(citations: &[Citation]) -> String {
    citations
        .iter()
        .enumerate()
        .map(|(index, citation)| {
            format!(
                r#"<div class="citation-item"><div class="citation-head">Source #{} ({}%)</div><div class="citation-body">{}</div></div>"#,
                index + 1,
                citation.percent(),
                format_text(&citation.chunk),
            )
        })
        .collect()
}

/// Header indicator for the mounted module.
pub fn module_indicator(title: &str) -> String {
    format!(
        r#"<span class="status-dot online"></span> {} <span class="mounted">[MOUNTED]</span>"#,
        escape_html(title)
    )
}

/// One entry of the chat listing.
pub fn session_item(session: &ChatSummary, active: bool) -> String {
    let class = if active { "chat-item active" } else { "chat-item" };
    format!(
        r#"<button class="{class}" data-id="{}">{}</button>"#,
        escape_html(&session.id),
        escape_html(&session.title),
    )
}

/// Detail panel for a module.
pub fn inspector_panel(module: &Module) -> String {
    format!(
        concat!(
            r#"<div class="inspector" data-id="{id}">"#,
            r#"<h2>{title}</h2>{badge}"#,
            r#"<dl><dt>Version</dt><dd>{version}</dd><dt>Size</dt><dd>{size}</dd></dl>"#,
            r#"<p>{description}</p>"#,
            "</div>"
        ),
        id = escape_html(&module.id),
        title = escape_html(&module.title),
        badge = badge(module.verified),
        version = escape_html(&module.version),
        size = escape_html(&module.size),
        description = format_text(&module.description),
    )
}

/// A displayed chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub id: MessageId,
    pub role: Role,
    /// Escaped contents of the bubble.
    pub html: String,
}

impl Bubble {
    /// Complete markup for this bubble.
    pub fn to_html(&self) -> String {
        message_bubble(self.role, &self.html)
    }
}

/// A [`View`] that renders into HTML fragments held in memory.
#[derive(Debug, Clone)]
pub struct HtmlView {
    bubbles: Vec<Bubble>,
    grid: String,
    sidebar_modules: Vec<Module>,
    sidebar_placeholder: Option<String>,
    active_module: Option<String>,
    module_indicator: Option<String>,
    sessions: String,
    session_title: Option<String>,
    citations: String,
    citations_visible: bool,
    toasts: Vec<(String, bool)>,
    input_enabled: bool,
    focus_requests: usize,
    inspector: Option<String>,
    theme: Theme,
    current_view: ViewName,
    confirm_answer: bool,
    prompts: Vec<String>,
}

impl Default for HtmlView {
    fn default() -> Self {
        Self {
            bubbles: Vec::new(),
            grid: String::new(),
            sidebar_modules: Vec::new(),
            sidebar_placeholder: None,
            active_module: None,
            module_indicator: None,
            sessions: String::new(),
            session_title: None,
            citations: String::new(),
            citations_visible: false,
            toasts: Vec::new(),
            input_enabled: true,
            focus_requests: 0,
            inspector: None,
            theme: Theme::default(),
            current_view: ViewName::Chat,
            confirm_answer: true,
            prompts: Vec::new(),
        }
    }
}

impl HtmlView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every confirmation prompt with `answer`.
    pub fn with_confirmation(mut self, answer: bool) -> Self {
        self.confirm_answer = answer;
        self
    }

    /// Displayed messages, oldest first.
    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Escaped contents of one bubble.
    pub fn bubble_html(&self, id: MessageId) -> Option<&str> {
        self.bubbles
            .iter()
            .find(|bubble| bubble.id == id)
            .map(|bubble| bubble.html.as_str())
    }

    /// Markup of the whole chat history.
    pub fn history_html(&self) -> String {
        self.bubbles.iter().map(Bubble::to_html).collect()
    }

    pub fn grid_html(&self) -> &str {
        &self.grid
    }

    pub fn sidebar_html(&self) -> String {
        if let Some(placeholder) = &self.sidebar_placeholder {
            return placeholder.clone();
        }
        self.sidebar_modules
            .iter()
            .map(|module| {
                let active = self.active_module.as_deref() == Some(module.id.as_str());
                sidebar_item(module, active)
            })
            .collect()
    }

    pub fn active_module(&self) -> Option<&str> {
        self.active_module.as_deref()
    }

    pub fn module_indicator(&self) -> Option<&str> {
        self.module_indicator.as_deref()
    }

    pub fn sessions_html(&self) -> &str {
        &self.sessions
    }

    pub fn session_title(&self) -> Option<&str> {
        self.session_title.as_deref()
    }

    pub fn citations_html(&self) -> &str {
        &self.citations
    }

    pub fn citations_visible(&self) -> bool {
        self.citations_visible
    }

    /// Every toast shown so far, with its error flag.
    pub fn toasts(&self) -> &[(String, bool)] {
        &self.toasts
    }

    pub fn input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn focus_requests(&self) -> usize {
        self.focus_requests
    }

    pub fn inspector_html(&self) -> Option<&str> {
        self.inspector.as_deref()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn current_view(&self) -> ViewName {
        self.current_view
    }

    /// Confirmation prompts shown so far.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    fn set_bubble(&mut self, id: MessageId, role: Role, html: String) {
        match self.bubbles.iter_mut().find(|bubble| bubble.id == id) {
            Some(bubble) => bubble.html = html,
            None => self.bubbles.push(Bubble { id, role, html }),
        }
    }
}

impl View for HtmlView {
    fn render_module_grid(&mut self, modules: &[Module]) {
        self.grid = modules.iter().map(module_card).collect();
    }

    fn render_module_sidebar(&mut self, modules: &[Module]) {
        self.sidebar_placeholder = None;
        self.sidebar_modules = modules.to_vec();
    }

    fn render_modules_empty(&mut self) {
        let empty = r#"<div class="empty-state">No modules detected.</div>"#.to_string();
        self.grid = empty.clone();
        self.sidebar_modules.clear();
        self.sidebar_placeholder = Some(empty);
    }

    fn render_modules_error(&mut self, error: &str) {
        self.grid = format!(
            r#"<p class="loading-text error">Error: {}</p>"#,
            escape_html(error)
        );
    }

    fn mark_active_module(&mut self, module_id: &str) {
        self.active_module = Some(module_id.to_string());
    }

    fn set_module_indicator(&mut self, title: &str) {
        self.module_indicator = Some(module_indicator(title));
    }

    fn render_sessions(&mut self, sessions: &[ChatSummary], active: Option<&str>) {
        self.sessions = sessions
            .iter()
            .map(|session| session_item(session, active == Some(session.id.as_str())))
            .collect();
    }

    fn set_session_title(&mut self, title: Option<&str>) {
        self.session_title = title.map(escape_html);
    }

    fn clear_history(&mut self) {
        self.bubbles.clear();
    }

    fn append_message(&mut self, id: MessageId, role: Role, text: &str) {
        self.set_bubble(id, role, format_text(text));
    }

    fn begin_reply(&mut self, id: MessageId) {
        self.set_bubble(id, Role::System, TYPING_CURSOR.to_string());
    }

    fn update_message(&mut self, id: MessageId, text: &str) {
        self.set_bubble(id, Role::System, format_text(text));
    }

    fn render_citations(&mut self, citations: &[Citation]) {
        self.citations = citation_list(citations);
        self.citations_visible = true;
    }

    fn hide_citations(&mut self) {
        self.citations_visible = false;
    }

    fn show_toast(&mut self, message: &str, is_error: bool) {
        self.toasts.push((message.to_string(), is_error));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    fn focus_input(&mut self) {
        self.focus_requests += 1;
    }

    fn open_inspector(&mut self, module: &Module) {
        self.inspector = Some(inspector_panel(module));
    }

    fn close_inspector(&mut self) {
        self.inspector = None;
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    fn switch_view(&mut self, view: ViewName) {
        self.current_view = view;
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.prompts.push(prompt.to_string());
        self.confirm_answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleRecord;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#39;y&#39;)&lt;/script&gt;"
        );
        assert_eq!(format_text("a < b\nc"), "a &lt; b<br>c");
    }

    #[test]
    fn bare_module_card_uses_defaults() {
        let module = Module::normalize(ModuleRecord::new("m1"));
        let card = module_card(&module);
        assert!(card.contains(r#"<div class="pkg-title">Untitled Module</div>"#));
        assert!(card.contains("v1.0"));
        assert!(card.contains(r#"<span class="pkg-size">Unknown</span>"#));
        assert!(card.contains("Local knowledge container"));
        assert!(card.contains(r#"<span class="badge unsigned">Unsigned</span>"#));
    }

    #[test]
    fn card_escapes_hostile_titles() {
        let module = Module::normalize(ModuleRecord::new("x\"y").with_title("<img src=x>"));
        let card = module_card(&module);
        assert!(card.contains("&lt;img src=x&gt;"));
        assert!(card.contains(r#"data-id="x&quot;y""#));
        assert!(!card.contains("<img"));
    }

    #[test]
    fn sidebar_shortens_and_marks_active() {
        let modules = vec![
            Module::normalize(ModuleRecord::new("a").with_title("Constitution and Civil Code")),
            Module::normalize(ModuleRecord::new("b").with_title("Tax").with_verified(true)),
        ];
        let mut view = HtmlView::new();
        view.render_module_sidebar(&modules);
        view.mark_active_module("b");

        let html = view.sidebar_html();
        assert!(html.contains("<span>Constitution and Civ..</span>"));
        assert!(html.contains(r#"<button class="nav-item module-item active" data-id="b">"#));
        assert!(html.contains(r#"<button class="nav-item module-item" data-id="a">"#));
        assert!(html.contains(r#"title="Verified""#));
    }

    #[test]
    fn citations_show_rounded_percentages() {
        let citations = vec![
            Citation::new("Article 1 <b>", 0.876),
            Citation::new("Article 2", 0.5),
        ];
        let html = citation_list(&citations);
        assert!(html.contains("Source #1 (88%)"));
        assert!(html.contains("Article 1 &lt;b&gt;"));
        assert!(html.contains("Source #2 (50%)"));
    }

    #[test]
    fn reply_starts_with_typing_cursor() {
        let mut view = HtmlView::new();
        view.begin_reply(MessageId(0));
        assert_eq!(view.bubble_html(MessageId(0)), Some(TYPING_CURSOR));

        view.update_message(MessageId(0), "line one\nline <two>");
        assert_eq!(
            view.bubble_html(MessageId(0)),
            Some("line one<br>line &lt;two&gt;")
        );
        assert!(view.history_html().starts_with(r#"<div class="msg system">"#));
    }

    #[test]
    fn empty_listing_is_distinct() {
        let mut view = HtmlView::new();
        view.render_modules_empty();
        assert!(view.grid_html().contains("No modules detected."));
        assert!(view.sidebar_html().contains("No modules detected."));

        view.render_modules_error("connection refused");
        assert!(view.grid_html().contains("Error: connection refused"));
    }
}
