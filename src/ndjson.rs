//! Newline-delimited JSON processing for streamed answers.
//!
//! The `ask_stream` endpoint answers with one JSON object per line. This
//! module turns the raw byte chunks of that body into [`StreamEvent`]s:
//!
//! - [`NdjsonDecoder`] splits buffered bytes into complete lines. Lines are
//!   cut at the byte level, and `\n` never occurs inside a multi-byte UTF-8
//!   sequence, so a character split across two chunks is only decoded once
//!   both halves are buffered.
//! - [`parse_line`] turns one line into an event, skipping blank lines.
//! - [`process_ndjson`] drives both over a byte stream. Malformed lines are
//!   dropped without ending the stream; transport errors are passed through.

use std::sync::Arc;
use std::time::Instant;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use tokio_util::codec::Decoder;

use crate::client_logger::ClientLogger;
use crate::observability::{
    STREAM_BYTES, STREAM_DURATION, STREAM_ERRORS, STREAM_EVENTS, STREAM_MALFORMED_LINES,
    STREAM_UNRECOGNIZED_EVENTS,
};
use crate::{Error, Result, StreamEvent};

/// Splits a byte buffer into `\n`-terminated lines.
///
/// Invalid UTF-8 inside a line is replaced rather than rejected, the same
/// way a browser text decoder treats it.
#[derive(Debug, Default, Clone)]
pub struct NdjsonDecoder {
    // Bytes before this offset are known to contain no newline.
    next_index: usize,
}

impl NdjsonDecoder {
    /// Creates a new decoder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for NdjsonDecoder {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        let read_to = src.len();
        let newline = src[self.next_index..read_to]
            .iter()
            .position(|b| *b == b'\n');

        match newline {
            Some(offset) => {
                let newline_index = self.next_index + offset;
                self.next_index = 0;
                let line = src.split_to(newline_index + 1);
                let line = &line[..line.len() - 1];
                Ok(Some(String::from_utf8_lossy(line).into_owned()))
            }
            None => {
                self.next_index = read_to;
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(Some(String::from_utf8_lossy(&rest).into_owned()))
    }
}

/// Parses one line of an answer stream.
///
/// Returns `None` for lines that are empty or whitespace-only.
pub fn parse_line(line: &str) -> Option<Result<StreamEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_str::<StreamEvent>(line).map_err(|e| {
        Error::serialization(format!("Malformed stream line: {e}"), Some(Box::new(e)))
    }))
}

struct NdjsonState<S> {
    stream: S,
    buffer: BytesMut,
    decoder: NdjsonDecoder,
    logger: Option<Arc<dyn ClientLogger>>,
    started: Instant,
    eof: bool,
    done: bool,
}

impl<S> NdjsonState<S> {
    fn finish(&mut self) {
        if !self.done {
            self.done = true;
            STREAM_DURATION.add(self.started.elapsed().as_secs_f64());
        }
    }

    fn discard(&self, line: &str, reason: &str) {
        if let Some(logger) = &self.logger {
            logger.log_discarded_line(line, reason);
        }
    }
}

/// Process a stream of bytes into a stream of answer events.
///
/// The returned stream ends when the body ends, or right after yielding the
/// first transport error. Dropping it drops the body, which aborts the
/// underlying request.
pub fn process_ndjson<S>(
    byte_stream: S,
    logger: Option<Arc<dyn ClientLogger>>,
) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let state = NdjsonState {
        stream: byte_stream,
        buffer: BytesMut::new(),
        decoder: NdjsonDecoder::new(),
        logger,
        started: Instant::now(),
        eof: false,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            // First drain every complete line already buffered
            let line = if state.eof {
                state.decoder.decode_eof(&mut state.buffer)
            } else {
                state.decoder.decode(&mut state.buffer)
            };
            match line {
                Ok(Some(line)) => match parse_line(&line) {
                    None => continue,
                    Some(Ok(event)) => {
                        STREAM_EVENTS.click();
                        if let Some(logger) = &state.logger {
                            logger.log_stream_event(&event);
                        }
                        if event == StreamEvent::Unrecognized {
                            STREAM_UNRECOGNIZED_EVENTS.click();
                            state.discard(&line, "unrecognized event type");
                        }
                        return Some((Ok(event), state));
                    }
                    Some(Err(err)) => {
                        STREAM_MALFORMED_LINES.click();
                        state.discard(&line, &err.to_string());
                        continue;
                    }
                },
                Ok(None) if state.eof => {
                    state.finish();
                    return None;
                }
                Ok(None) => {}
                Err(err) => {
                    state.finish();
                    return Some((Err(err), state));
                }
            }

            // Read more data
            match state.stream.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    state.buffer.extend_from_slice(&bytes);
                }
                Some(Err(err)) => {
                    STREAM_ERRORS.click();
                    state.finish();
                    return Some((Err(err), state));
                }
                None => state.eof = true,
            }
        }
    })
}
