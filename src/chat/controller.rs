//! The chat controller: session and module state plus every user action.
//!
//! All operations take `&self`. State and view sit behind mutexes that are
//! only ever held for synchronous updates, so several operations can be in
//! flight on one task and interleave the way UI event handlers do.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::StreamExt;

use crate::chat::pending::{PendingRequest, RequestTicket};
use crate::chat::state::SessionState;
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::ndjson::process_ndjson;
use crate::observability::{STREAM_CANCELLED, UPLOAD_ERRORS, UPLOADS};
use crate::preferences::{Preferences, Theme};
use crate::render::{MessageId, View, ViewName};
use crate::types::{
    Answer, AskRequest, ChatDetail, ChatSummary, Citation, FileUpload, Message, Module, Role,
    StreamEvent, UploadReceipt,
};
use crate::utils::time::default_session_title;

/// First message of every new chat.
pub const READY_MESSAGE: &str = "Terminal ready. Pick a module in DATA CORE or type a question.";

/// How a streamed answer ended.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The stream ended normally.
    Completed { answer: String },
    /// The request was cancelled, by the user or by a newer request.
    Cancelled,
    /// The request failed; the reply bubble shows the error.
    Failed(Error),
}

impl TurnOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TurnOutcome::Completed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TurnOutcome::Cancelled)
    }
}

/// Drives a chat window.
pub struct ChatController<G: Gateway, V: View> {
    gateway: G,
    view: Mutex<V>,
    state: Mutex<SessionState>,
    pending: PendingRequest,
    preferences: Box<dyn Preferences>,
}

impl<G: Gateway, V: View> ChatController<G, V> {
    /// Creates a controller and applies the stored theme to the view.
    pub fn new(gateway: G, mut view: V, preferences: Box<dyn Preferences>) -> Self {
        let theme = preferences.theme();
        view.apply_theme(theme);
        Self {
            gateway,
            view: Mutex::new(view),
            state: Mutex::new(SessionState::new(theme)),
            pending: PendingRequest::new(),
            preferences,
        }
    }

    fn view(&self) -> MutexGuard<'_, V> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` against the view.
    pub fn with_view<R>(&self, f: impl FnOnce(&V) -> R) -> R {
        f(&self.view())
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Loads the module listing and opens a fresh chat.
    pub async fn start(&self) -> Result<()> {
        // A failed listing is already shown in the grid.
        let _ = self.load_modules().await;
        self.create_session(None).await.map(|_| ())
    }

    ///////////////////////////////////////////// Sessions ////////////////////////////////////////

    /// Creates a chat and makes it the active one.
    ///
    /// Without a title, one is generated from the clock.
    pub async fn create_session(&self, title: Option<&str>) -> Result<ChatSummary> {
        let title = match title {
            Some(title) => title.to_string(),
            None => default_session_title(),
        };
        let chat = match self.gateway.create_chat(&title).await {
            Ok(chat) => chat,
            Err(err) => {
                self.view()
                    .show_toast(&format!("Session initialization failed: {err}"), true);
                return Err(err);
            }
        };

        self.pending.cancel();
        {
            let mut state = self.state();
            state.clear_session();
            state.session_id = Some(chat.id.clone());
            state.session_title = Some(chat.title.clone());
        }
        {
            let mut view = self.view();
            view.clear_history();
            view.hide_citations();
            view.set_session_title(Some(&chat.title));
        }
        self.push_message(Role::System, READY_MESSAGE);
        Ok(chat)
    }

    /// Returns the active chat id, creating a chat when there is none.
    pub async fn ensure_session(&self) -> Result<String> {
        let existing = self.state().session_id.clone();
        match existing {
            Some(id) => Ok(id),
            None => self.create_session(None).await.map(|chat| chat.id),
        }
    }

    /// Fetches and displays the chat listing.
    pub async fn list_sessions(&self) -> Result<Vec<ChatSummary>> {
        match self.gateway.list_chats().await {
            Ok(chats) => {
                let active = self.state().session_id.clone();
                self.view().render_sessions(&chats, active.as_deref());
                Ok(chats)
            }
            Err(err) => {
                self.view()
                    .show_toast(&format!("Could not load chats: {err}"), true);
                Err(err)
            }
        }
    }

    /// Makes an existing chat the active one and displays its transcript.
    pub async fn open_session(&self, chat_id: &str) -> Result<ChatDetail> {
        let detail = match self.gateway.get_chat(chat_id).await {
            Ok(detail) => detail,
            Err(err) => {
                self.view()
                    .show_toast(&format!("Could not open chat: {err}"), true);
                return Err(err);
            }
        };

        self.pending.cancel();
        {
            let mut state = self.state();
            state.clear_session();
            state.session_id = Some(detail.id.clone().unwrap_or_else(|| chat_id.to_string()));
            state.session_title = Some(detail.title.clone());
            state.history = detail.messages.clone();
        }
        let mut view = self.view();
        view.clear_history();
        view.hide_citations();
        view.set_session_title(Some(&detail.title));
        for (index, message) in detail.messages.iter().enumerate() {
            view.append_message(MessageId(index), message.role, &message.content);
        }
        view.scroll_to_bottom();
        drop(view);
        Ok(detail)
    }

    /// Deletes a chat once the user confirms.
    ///
    /// Returns `Ok(false)` without touching the network when the user
    /// declines. Deleting the active chat clears the history and the title.
    /// The listing is refreshed afterwards either way.
    pub async fn delete_session(&self, chat_id: &str) -> Result<bool> {
        let confirmed = self
            .view()
            .confirm(&format!("Delete chat {chat_id}? This cannot be undone."));
        if !confirmed {
            return Ok(false);
        }

        if let Err(err) = self.gateway.delete_chat(chat_id).await {
            self.view()
                .show_toast(&format!("Could not delete chat: {err}"), true);
            return Err(err);
        }

        let was_active = {
            let mut state = self.state();
            if state.session_id.as_deref() == Some(chat_id) {
                state.clear_session();
                true
            } else {
                false
            }
        };
        if was_active {
            self.pending.cancel();
            let mut view = self.view();
            view.clear_history();
            view.hide_citations();
            view.set_session_title(None);
        }

        // A failed refresh has already been reported.
        let _ = self.list_sessions().await;
        Ok(true)
    }

    ///////////////////////////////////////////// Modules /////////////////////////////////////////

    /// Fetches the module listing, caches it and renders grid and sidebar.
    pub async fn load_modules(&self) -> Result<Vec<Module>> {
        let records = match self.gateway.list_modules().await {
            Ok(records) => records,
            Err(err) => {
                self.view().render_modules_error(&err.to_string());
                return Err(err);
            }
        };
        let modules: Vec<Module> = records.into_iter().map(Module::normalize).collect();

        let active = {
            let mut state = self.state();
            state.modules = modules.clone();
            state.active_module_id.clone()
        };
        let mut view = self.view();
        if modules.is_empty() {
            view.render_modules_empty();
        } else {
            view.render_module_grid(&modules);
            view.render_module_sidebar(&modules);
            if let Some(active) = &active {
                view.mark_active_module(active);
            }
        }
        drop(view);
        Ok(modules)
    }

    /// Scopes answers to a module.
    ///
    /// Creates a chat if none is active; a failure there is only reported
    /// as a toast and the module is activated regardless.
    pub async fn activate_module(&self, module_id: &str, title: &str) {
        self.state().active_module_id = Some(module_id.to_string());
        // create_session reports its own failure.
        let _ = self.ensure_session().await;

        {
            let mut view = self.view();
            view.mark_active_module(module_id);
            view.set_module_indicator(title);
        }
        self.push_message(Role::System, &format!("Context switched to module: {title}"));
        self.view().show_toast(&format!("Module mounted: {title}"), false);
        self.switch_view(ViewName::Chat);
    }

    /// Activates a cached module by id or 1-based position.
    pub async fn mount(&self, selector: &str) -> Result<Module> {
        let module = self.lookup_module(selector)?;
        self.activate_module(&module.id, &module.title).await;
        Ok(module)
    }

    /// Shows a cached module in the inspector.
    pub fn open_inspector(&self, selector: &str) -> Result<Module> {
        let module = self.lookup_module(selector)?;
        self.state().inspected_module = Some(module.clone());
        self.view().open_inspector(&module);
        Ok(module)
    }

    pub fn close_inspector(&self) {
        self.state().inspected_module = None;
        self.view().close_inspector();
    }

    /// Activates the module shown in the inspector. Returns false when the
    /// inspector is closed.
    pub async fn activate_inspected(&self) -> bool {
        let inspected = self.state().inspected_module.clone();
        match inspected {
            Some(module) => {
                self.activate_module(&module.id, &module.title).await;
                self.close_inspector();
                true
            }
            None => false,
        }
    }

    fn lookup_module(&self, selector: &str) -> Result<Module> {
        let found = self.state().find_module(selector).cloned();
        found.ok_or_else(|| {
            Error::validation(
                format!("no module matches {selector:?}; run /modules to refresh"),
                Some("module".to_string()),
            )
        })
    }

    /////////////////////////////////////////// Messaging /////////////////////////////////////////

    /// Sends a question into the active chat and streams the answer.
    ///
    /// Starting a send cancels any answer still streaming. An empty query
    /// is rejected with a validation error before anything is shown.
    pub async fn send_message(&self, query: &str) -> Result<TurnOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation(
                "query must not be empty",
                Some("query".to_string()),
            ));
        }
        let chat_id = self.ensure_session().await?;

        {
            let mut view = self.view();
            view.set_input_enabled(false);
            view.hide_citations();
        }
        self.push_message(Role::User, query);
        let reply = self.begin_reply();

        let module_id = self.state().active_module_id.clone();
        let request = AskRequest::new(query, module_id);
        let ticket = self.pending.begin();
        let outcome = self.stream_reply(&chat_id, &request, &ticket, reply).await;

        if self.pending.finish(&ticket) {
            let mut view = self.view();
            view.set_input_enabled(true);
            view.focus_input();
        }
        Ok(outcome)
    }

    async fn stream_reply(
        &self,
        chat_id: &str,
        request: &AskRequest,
        ticket: &RequestTicket,
        reply: MessageId,
    ) -> TurnOutcome {
        let token = ticket.token();
        let body = tokio::select! {
            biased;
            _ = token.cancelled() => return Self::cancelled(),
            body = self.gateway.ask_stream(chat_id, request) => body,
        };
        let body = match body {
            Ok(body) => body,
            Err(err) => return self.fail_reply(reply, err),
        };

        let mut events = Box::pin(process_ndjson(body, self.gateway.logger()));
        let mut answer = String::new();
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => return Self::cancelled(),
                event = events.next() => event,
            };
            match event {
                None => break,
                Some(Ok(StreamEvent::Token { content })) => {
                    answer.push_str(&content);
                    self.set_message(reply, &answer);
                    self.view().scroll_to_bottom();
                }
                Some(Ok(StreamEvent::Sources { data })) => self.store_citations(data),
                Some(Ok(StreamEvent::Unrecognized)) => {}
                Some(Err(err)) => return self.fail_reply(reply, err),
            }
        }
        TurnOutcome::Completed { answer }
    }

    fn cancelled() -> TurnOutcome {
        STREAM_CANCELLED.click();
        TurnOutcome::Cancelled
    }

    fn fail_reply(&self, reply: MessageId, err: Error) -> TurnOutcome {
        self.set_message(reply, &format!("Connection error: {err}"));
        TurnOutcome::Failed(err)
    }

    /// Asks once through the stateless endpoint.
    ///
    /// Requires a non-empty query and an active module.
    pub async fn ask_once(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::validation(
                "query must not be empty",
                Some("query".to_string()),
            ));
        }
        let module_id = self.state().active_module_id.clone();
        let Some(module_id) = module_id else {
            return Err(Error::validation(
                "mount a module before asking",
                Some("module_id".to_string()),
            ));
        };

        self.view().hide_citations();
        self.push_message(Role::User, query);
        let request = AskRequest::new(query, Some(module_id));
        match self.gateway.ask(&request).await {
            Ok(answer) => {
                self.push_message(Role::System, &answer.answer);
                self.store_citations(answer.sources.clone());
                Ok(answer)
            }
            Err(err) => {
                self.push_message(Role::System, &format!("Error: {err}"));
                Err(err)
            }
        }
    }

    /// Displays the citations of the most recent answer again.
    pub fn show_citations(&self) -> usize {
        let citations = self.state().citations.clone();
        let mut view = self.view();
        if citations.is_empty() {
            view.show_toast("No sources for the last answer.", false);
        } else {
            view.render_citations(&citations);
        }
        citations.len()
    }

    fn store_citations(&self, citations: Vec<Citation>) {
        self.view().render_citations(&citations);
        self.state().citations = citations;
    }

    ////////////////////////////////////////////// Files //////////////////////////////////////////

    /// Reads a file from disk and ingests it into the active chat.
    pub async fn upload_file(&self, path: impl AsRef<Path>) -> Result<UploadReceipt> {
        let path = path.as_ref();
        let Some(filename) = path.file_name().map(|name| name.to_string_lossy().into_owned())
        else {
            return Err(Error::validation(
                format!("{} does not name a file", path.display()),
                Some("path".to_string()),
            ));
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = Error::io(format!("failed to read {}", path.display()), err);
                self.push_message(Role::System, &format!("Error: {err}"));
                return Err(err);
            }
        };
        self.upload_bytes(FileUpload::new(filename, bytes)).await
    }

    /// Ingests a file into the active chat, creating a chat when needed.
    ///
    /// A placeholder message is shown while the upload runs and replaced by
    /// a confirmation once it succeeds.
    pub async fn upload_bytes(&self, upload: FileUpload) -> Result<UploadReceipt> {
        let chat_id = self.ensure_session().await?;
        let placeholder = self.push_message(
            Role::System,
            &format!("Ingesting file: {}...", upload.filename),
        );

        match self.gateway.upload(&chat_id, upload).await {
            Ok(receipt) => {
                UPLOADS.click();
                self.set_message(
                    placeholder,
                    &format!(
                        "File {} integrated into the current session ({} fragments).",
                        receipt.filename, receipt.chunks
                    ),
                );
                Ok(receipt)
            }
            Err(err) => {
                UPLOAD_ERRORS.click();
                self.push_message(Role::System, &format!("Error: {err}"));
                Err(err)
            }
        }
    }

    ///////////////////////////////////////////// Display /////////////////////////////////////////

    /// Flips the theme, applies it and stores it.
    pub fn toggle_theme(&self) -> Theme {
        let theme = {
            let mut state = self.state();
            state.theme = state.theme.toggled();
            state.theme
        };
        let mut view = self.view();
        view.apply_theme(theme);
        if let Err(err) = self.preferences.set_theme(theme) {
            view.show_toast(&format!("Could not save theme: {err}"), true);
        }
        theme
    }

    /// Brings a screen to the front and closes the inspector.
    pub fn switch_view(&self, target: ViewName) {
        self.view().switch_view(target);
        self.close_inspector();
    }

    fn push_message(&self, role: Role, text: &str) -> MessageId {
        let id = {
            let mut state = self.state();
            state.history.push(Message::new(role, text));
            MessageId(state.history.len() - 1)
        };
        let mut view = self.view();
        view.append_message(id, role, text);
        view.scroll_to_bottom();
        id
    }

    fn begin_reply(&self) -> MessageId {
        let id = {
            let mut state = self.state();
            state.history.push(Message::new(Role::System, ""));
            MessageId(state.history.len() - 1)
        };
        let mut view = self.view();
        view.begin_reply(id);
        view.scroll_to_bottom();
        id
    }

    fn set_message(&self, id: MessageId, text: &str) {
        if let Some(message) = self.state().history.get_mut(id.0) {
            message.content = text.to_string();
        }
        self.view().update_message(id, text);
    }

    ////////////////////////////////////////////// Queries ////////////////////////////////////////

    pub fn session_id(&self) -> Option<String> {
        self.state().session_id.clone()
    }

    pub fn session_title(&self) -> Option<String> {
        self.state().session_title.clone()
    }

    pub fn active_module_id(&self) -> Option<String> {
        self.state().active_module_id.clone()
    }

    pub fn theme(&self) -> Theme {
        self.state().theme
    }

    pub fn history(&self) -> Vec<Message> {
        self.state().history.clone()
    }

    pub fn citations(&self) -> Vec<Citation> {
        self.state().citations.clone()
    }

    pub fn modules(&self) -> Vec<Module> {
        self.state().modules.clone()
    }

    pub fn inspected_module(&self) -> Option<Module> {
        self.state().inspected_module.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_pending()
    }

    /// Cancels the answer being streamed, if any.
    pub fn cancel_pending(&self) -> bool {
        self.pending.cancel()
    }

    /// A handle that can cancel the streamed answer from another thread.
    pub fn pending_handle(&self) -> PendingRequest {
        self.pending.clone()
    }
}
