//! Chat application module for the Kovcheg terminal client.
//!
//! This module holds everything between the service gateway and a view:
//!
//! - Module listing, activation and inspection
//! - Session creation, switching and deletion
//! - Streaming answers with cancellation of superseded requests
//! - File uploads, citations and the persisted theme
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`controller`]: the [`ChatController`] that runs every user action
//! - [`commands`]: Slash command parsing
//! - [`pending`]: the single in-flight streamed request
//! - [`state`]: client-side session state

mod commands;
mod config;
mod controller;
mod pending;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::render::{MessageId, TerminalView, View, ViewName};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use controller::{ChatController, READY_MESSAGE, TurnOutcome};
pub use pending::{PendingRequest, RequestTicket};
pub use state::SessionState;
