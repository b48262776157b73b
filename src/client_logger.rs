//! Logging trait for Kovcheg client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! and log every interaction passing through the [`Kovcheg`](crate::Kovcheg)
//! client, including stream lines the client decided to drop.

use crate::StreamEvent;

/// A trait for logging Kovcheg client operations.
///
/// Implement this trait to capture requests and the decoded answer stream.
///
/// # Example
///
/// ```rust,ignore
/// use kovcheg::{ClientLogger, StreamEvent};
/// use std::io::Write;
/// use std::sync::Mutex;
///
/// struct FileLogger {
///     file: Mutex<std::fs::File>,
/// }
///
/// impl ClientLogger for FileLogger {
///     fn log_request(&self, method: &str, url: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "{method} {url}").unwrap();
///     }
///
///     fn log_stream_event(&self, event: &StreamEvent) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "event: {}", serde_json::to_string(event).unwrap()).unwrap();
///     }
///
///     fn log_discarded_line(&self, line: &str, reason: &str) {
///         let mut file = self.file.lock().unwrap();
///         writeln!(file, "dropped ({reason}): {line}").unwrap();
///     }
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log an outgoing request.
    fn log_request(&self, method: &str, url: &str);

    /// Log an individual streaming event.
    ///
    /// Called for every line of an answer stream that decoded into a
    /// [`StreamEvent`], including [`StreamEvent::Unrecognized`].
    fn log_stream_event(&self, event: &StreamEvent);

    /// Log a stream line that was skipped.
    ///
    /// Malformed JSON and unrecognized event types end up here; neither
    /// interrupts the stream.
    fn log_discarded_line(&self, line: &str, reason: &str);
}

/// Writes one line per logged item to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLogger;

impl ClientLogger for StderrLogger {
    fn log_request(&self, method: &str, url: &str) {
        eprintln!("[kovcheg] {method} {url}");
    }

    fn log_stream_event(&self, event: &StreamEvent) {
        match event {
            StreamEvent::Token { content } => {
                eprintln!("[kovcheg] token ({} bytes)", content.len())
            }
            StreamEvent::Sources { data } => eprintln!("[kovcheg] sources ({})", data.len()),
            StreamEvent::Unrecognized => eprintln!("[kovcheg] unrecognized event"),
        }
    }

    fn log_discarded_line(&self, line: &str, reason: &str) {
        eprintln!("[kovcheg] dropped line ({reason}): {line:?}");
    }
}
