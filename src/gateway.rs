//! The seam between the chat controller and the HTTP service.
//!
//! [`Gateway`] names every endpoint the client consumes. [`Kovcheg`] is the
//! production implementation; tests substitute scripted ones.
//!
//! [`Kovcheg`]: crate::Kovcheg

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;

use crate::client_logger::ClientLogger;
use crate::error::Result;
use crate::types::{
    Answer, AskRequest, ChatDetail, ChatSummary, FileUpload, ModuleRecord, UploadReceipt,
};

/// Raw body of a streamed answer.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Every call the chat client makes against the service.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// `GET modules`
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>>;

    /// `POST chats`
    async fn create_chat(&self, title: &str) -> Result<ChatSummary>;

    /// `GET chats`
    async fn list_chats(&self) -> Result<Vec<ChatSummary>>;

    /// `GET chats/{id}`
    async fn get_chat(&self, chat_id: &str) -> Result<ChatDetail>;

    /// `DELETE chats/{id}`
    async fn delete_chat(&self, chat_id: &str) -> Result<()>;

    /// `POST chats/{id}/ask_stream`
    ///
    /// Resolves once response headers arrive with a success status; the
    /// returned body is newline-delimited JSON.
    async fn ask_stream(&self, chat_id: &str, request: &AskRequest) -> Result<ByteStream>;

    /// `POST chats/{id}/upload`
    async fn upload(&self, chat_id: &str, upload: FileUpload) -> Result<UploadReceipt>;

    /// `POST ask`
    async fn ask(&self, request: &AskRequest) -> Result<Answer>;

    /// Logger that stream decoding should report to.
    fn logger(&self) -> Option<Arc<dyn ClientLogger>> {
        None
    }
}
