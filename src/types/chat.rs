use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat message.
///
/// The service stores answers under `system`; `assistant` is accepted as an
/// alias.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// Answers and client notices.
    #[serde(alias = "assistant")]
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::System => write!(f, "system"),
        }
    }
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Who wrote the message.
    pub role: Role,
    /// Plain message text.
    pub content: String,
}

impl Message {
    /// Creates a new message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat as listed by the service, or as returned on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatSummary {
    /// Opaque chat identifier.
    pub id: String,
    /// Chat title.
    pub title: String,
}

/// Body of the create-chat request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateChatRequest {
    /// Title for the new chat.
    pub title: String,
}

/// A chat with its full transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatDetail {
    /// Opaque chat identifier, when the service echoes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Chat title.
    pub title: String,
    /// Messages in order.
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_accepts_extra_fields() {
        let json = r#"{
            "id": "c1",
            "title": "SESSION_0042",
            "messages": [
                {"role": "user", "content": "hi", "created_at": "2024-01-01T00:00:00"},
                {"role": "system", "content": "hello", "sources": [], "created_at": "2024-01-01T00:00:01"}
            ]
        }"#;
        let detail: ChatDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.id.as_deref(), Some("c1"));
        assert_eq!(detail.messages.len(), 2);
        assert_eq!(detail.messages[0], Message::new(Role::User, "hi"));
        assert_eq!(detail.messages[1].role, Role::System);
    }

    #[test]
    fn assistant_role_is_an_alias() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"ok"}"#).unwrap();
        assert_eq!(message.role, Role::System);
    }

    #[test]
    fn create_request_shape() {
        let body = CreateChatRequest {
            title: "SESSION_1234".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"title":"SESSION_1234"}"#
        );
    }
}
