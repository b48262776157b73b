// Public modules
pub mod ask;
pub mod chat;
pub mod module;
pub mod stream_event;
pub mod upload;

// Re-exports
pub use ask::{Answer, AskRequest};
pub use chat::{ChatDetail, ChatSummary, CreateChatRequest, Message, Role};
pub use module::{
    DEFAULT_MODULE_DESCRIPTION, DEFAULT_MODULE_SIZE, DEFAULT_MODULE_TITLE, DEFAULT_MODULE_VERSION,
    Module, ModuleRecord,
};
pub use stream_event::{Citation, StreamEvent};
pub use upload::{FileUpload, UploadReceipt};
