use serde::{Deserialize, Serialize};

/// A scored source excerpt returned alongside an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The excerpt text. Untrusted; escape before display.
    pub chunk: String,
    /// Relevance in `[0, 1]`.
    pub score: f64,
}

impl Citation {
    /// Creates a new citation.
    pub fn new(chunk: impl Into<String>, score: f64) -> Self {
        Self {
            chunk: chunk.into(),
            score,
        }
    }

    /// Score as a whole percentage, clamped to `0..=100`.
    pub fn percent(&self) -> u8 {
        (self.score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// One line of the `ask_stream` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// A fragment of the answer text.
    Token {
        /// Text to append to the answer.
        content: String,
    },

    /// The citation set for the answer.
    Sources {
        /// Citations, replacing any shown before.
        data: Vec<Citation>,
    },

    /// Valid JSON with a `type` this client does not know.
    #[serde(other)]
    Unrecognized,
}
