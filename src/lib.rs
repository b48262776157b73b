// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod error;
pub mod gateway;
pub mod markup;
pub mod ndjson;
pub mod preferences;
pub mod render;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use client::Kovcheg;
pub use client_logger::{ClientLogger, StderrLogger};
pub use error::{Error, Result};
pub use gateway::{ByteStream, Gateway};
pub use markup::HtmlView;
pub use ndjson::{NdjsonDecoder, process_ndjson};
pub use observability::register_biometrics;
pub use preferences::{FilePreferences, MemoryPreferences, Preferences, Theme};
pub use render::{TerminalView, View};
pub use types::*;
