use serde::{Deserialize, Serialize};

use crate::types::Citation;

/// Body shared by the streaming and single-shot ask endpoints.
///
/// `module_id` is always sent; `null` lets the service pick its default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AskRequest {
    /// The user's question.
    pub query: String,
    /// Module to scope the answer to.
    pub module_id: Option<String>,
}

impl AskRequest {
    /// Creates a new ask request.
    pub fn new(query: impl Into<String>, module_id: Option<String>) -> Self {
        Self {
            query: query.into(),
            module_id,
        }
    }
}

/// Response of the single-shot ask endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The full answer text.
    pub answer: String,
    /// Supporting excerpts.
    #[serde(default)]
    pub sources: Vec<Citation>,
}
