//! Message, history record, and conversation turn types.
//!
//! Three shapes flow through a turn:
//! - [`StoredMessage`]: the host's durable message log entry (`{content, type, time}`)
//! - [`ConversationTurn`]: an immutable turn inside the memory window
//! - [`Message`]: the wire-level chat message sent to a provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender in a provider conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, format rules)
    System,
    /// Tool execution result
    Tool,
}

/// A single message in a provider conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (speaker name, provider info, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// The speaker name attached to this message, if any.
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(|v| v.as_str())
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Arguments as JSON string
    pub arguments: String,
}

/// Who produced a turn in the host's message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    #[serde(rename = "human")]
    Human,
    #[serde(rename = "ai")]
    Assistant,
}

impl Speaker {
    /// The tag the host log and the provider message name use.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "ai",
        }
    }
}

/// One entry of the host application's durable message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: Speaker,
    pub time: String,
}

impl StoredMessage {
    pub fn human(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: Speaker::Human,
            time: time.into(),
        }
    }

    pub fn ai(content: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: Speaker::Assistant,
            time: time.into(),
        }
    }
}

/// An immutable turn inside the memory window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: String,
}

impl ConversationTurn {
    /// Convert into a provider message tagged with the speaker name.
    pub fn to_message(&self) -> Message {
        let mut msg = match self.speaker {
            Speaker::Human => Message::user(&self.text),
            Speaker::Assistant => Message::assistant(&self.text),
        };
        msg.metadata
            .insert("name".into(), serde_json::Value::from(self.speaker.tag()));
        msg
    }
}

impl From<&StoredMessage> for ConversationTurn {
    fn from(record: &StoredMessage) -> Self {
        Self {
            speaker: record.kind,
            text: record.content.clone(),
            timestamp: record.time.clone(),
        }
    }
}
