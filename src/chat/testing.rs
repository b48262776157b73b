//! In-memory gateway for controller tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use bytes::Bytes;
use futures::stream;

use crate::error::{Error, Result};
use crate::gateway::{ByteStream, Gateway};
use crate::types::{
    Answer, AskRequest, ChatDetail, ChatSummary, Citation, FileUpload, Message, ModuleRecord,
    UploadReceipt,
};

/// A body that yields `chunks` as separate reads.
pub fn chunked(chunks: &[&str]) -> ByteStream {
    let items: Vec<Result<Bytes>> = chunks
        .iter()
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk.as_bytes())))
        .collect();
    Box::pin(stream::iter(items))
}

/// A body delivered `size` bytes at a time, splitting characters freely.
pub fn split_every(body: &str, size: usize) -> ByteStream {
    let items: Vec<Result<Bytes>> = body
        .as_bytes()
        .chunks(size)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    Box::pin(stream::iter(items))
}

/// One `token` line.
pub fn token_line(content: &str) -> String {
    format!(
        "{}\n",
        serde_json::json!({"type": "token", "content": content})
    )
}

/// Gateway whose answers are scripted per query.
#[derive(Default)]
pub struct ScriptedGateway {
    modules: Mutex<Option<Vec<ModuleRecord>>>,
    chats: Mutex<Vec<ChatSummary>>,
    transcripts: Mutex<HashMap<String, Vec<Message>>>,
    streams: Mutex<HashMap<String, Result<ByteStream>>>,
    answers: Mutex<HashMap<String, Answer>>,
    calls: Mutex<Vec<String>>,
    next_chat: AtomicUsize,
    fail_create: AtomicBool,
    fail_upload: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap()
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            modules: Mutex::new(Some(Vec::new())),
            ..Self::default()
        }
    }

    pub fn with_modules(self, modules: Vec<ModuleRecord>) -> Self {
        *lock(&self.modules) = Some(modules);
        self
    }

    /// Makes the module listing fail.
    pub fn without_modules(self) -> Self {
        *lock(&self.modules) = None;
        self
    }

    pub fn with_chat(self, chat: ChatSummary, messages: Vec<Message>) -> Self {
        lock(&self.transcripts).insert(chat.id.clone(), messages);
        lock(&self.chats).push(chat);
        self
    }

    pub fn with_stream(self, query: &str, body: ByteStream) -> Self {
        lock(&self.streams).insert(query.to_string(), Ok(body));
        self
    }

    pub fn with_stream_error(self, query: &str, err: Error) -> Self {
        lock(&self.streams).insert(query.to_string(), Err(err));
        self
    }

    pub fn with_answer(self, query: &str, answer: &str, sources: Vec<Citation>) -> Self {
        lock(&self.answers).insert(
            query.to_string(),
            Answer {
                answer: answer.to_string(),
                sources,
            },
        );
        self
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upload(&self, fail: bool) {
        self.fail_upload.store(fail, Ordering::SeqCst);
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: String) {
        lock(&self.calls).push(call);
    }
}

#[async_trait::async_trait]
impl Gateway for ScriptedGateway {
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>> {
        self.record("list_modules".to_string());
        lock(&self.modules)
            .clone()
            .ok_or_else(|| Error::service_unavailable("module storage offline"))
    }

    async fn create_chat(&self, title: &str) -> Result<ChatSummary> {
        self.record(format!("create_chat {title}"));
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Error::internal_server("database locked"));
        }
        let n = self.next_chat.fetch_add(1, Ordering::SeqCst) + 1;
        let chat = ChatSummary {
            id: format!("chat-{n}"),
            title: title.to_string(),
        };
        lock(&self.chats).push(chat.clone());
        Ok(chat)
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        self.record("list_chats".to_string());
        Ok(lock(&self.chats).clone())
    }

    async fn get_chat(&self, chat_id: &str) -> Result<ChatDetail> {
        self.record(format!("get_chat {chat_id}"));
        let title = lock(&self.chats)
            .iter()
            .find(|chat| chat.id == chat_id)
            .map(|chat| chat.title.clone())
            .ok_or_else(|| Error::not_found("Chat not found", Some(chat_id.to_string())))?;
        let messages = lock(&self.transcripts)
            .get(chat_id)
            .cloned()
            .unwrap_or_default();
        Ok(ChatDetail {
            id: Some(chat_id.to_string()),
            title,
            messages,
        })
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        self.record(format!("delete_chat {chat_id}"));
        lock(&self.chats).retain(|chat| chat.id != chat_id);
        Ok(())
    }

    async fn ask_stream(&self, chat_id: &str, request: &AskRequest) -> Result<ByteStream> {
        self.record(format!(
            "ask_stream {chat_id} {} {}",
            request.query,
            request.module_id.as_deref().unwrap_or("-")
        ));
        lock(&self.streams)
            .remove(&request.query)
            .unwrap_or_else(|| Err(Error::not_found("no scripted stream", None)))
    }

    async fn upload(&self, chat_id: &str, upload: FileUpload) -> Result<UploadReceipt> {
        self.record(format!("upload {chat_id} {}", upload.filename));
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(Error::bad_request("Unsupported file type"));
        }
        Ok(UploadReceipt {
            filename: upload.filename,
            chunks: upload.bytes.len().div_ceil(4) as u64,
        })
    }

    async fn ask(&self, request: &AskRequest) -> Result<Answer> {
        self.record(format!(
            "ask {} {}",
            request.query,
            request.module_id.as_deref().unwrap_or("-")
        ));
        lock(&self.answers)
            .get(&request.query)
            .cloned()
            .ok_or_else(|| Error::internal_server("no scripted answer"))
    }
}
