use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::ids::{AssistantId, MessageId, RunId, ThreadId};

/// Remote conversation context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    pub created_at: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Thread {
    pub fn created(&self) -> DateTime<Utc> {
        super::timestamp(self.created_at)
    }
}

/// Author of a thread message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message stored on a remote thread. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub role: Role,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    pub created_at: i64,
    #[serde(default)]
    pub assistant_id: Option<AssistantId>,
    #[serde(default)]
    pub run_id: Option<RunId>,
}

impl ThreadMessage {
    /// Concatenated text of all text parts, separated by newlines
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(MessageContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn created(&self) -> DateTime<Utc> {
        super::timestamp(self.created_at)
    }
}

/// One content part of a thread message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: TextContent,
    },

    ImageFile {
        image_file: serde_json::Value,
    },

    /// Any part type this client does not model
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextContent {
    pub value: String,
    #[serde(default)]
    pub annotations: Vec<serde_json::Value>,
}

impl MessageContent {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: TextContent {
                value: value.into(),
                annotations: Vec::new(),
            },
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(&text.value),
            _ => None,
        }
    }
}

/// Paginated list envelope (`{"object": "list", "data": [...]}`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub first_id: Option<String>,
    #[serde(default)]
    pub last_id: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}
