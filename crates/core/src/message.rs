//! Training example wire format.
//!
//! These types serialize to exactly the chat-completion fine-tuning shape:
//! one [`TrainingExample`] per JSONL line. Field order here is the field
//! order on the wire.

use crate::tool::ToolDefinition;
use serde::{Deserialize, Serialize};

/// Role of an exported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions for the model
    System,
    /// The caller
    User,
    /// The agent behavior being taught
    Assistant,
    /// A tool result
    Tool,
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// A single message in a training example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message
    pub role: ChatRole,

    /// Text content; omitted on function-call-only assistant messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Training weight (assistant messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u8>,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ChatToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn bare(role: ChatRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            weight: None,
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::bare(ChatRole::System, Some(content.into()))
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::bare(ChatRole::User, Some(content.into()))
    }

    /// Create an assistant message with a training weight.
    pub fn assistant(content: impl Into<String>, weight: u8) -> Self {
        Self {
            weight: Some(weight),
            ..Self::bare(ChatRole::Assistant, Some(content.into()))
        }
    }

    /// Create a tool result message.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::bare(ChatRole::Tool, Some(content.into()))
        }
    }

    /// Content as a string slice, empty when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatToolCall {
    /// Sequential call id (`call_001`, `call_002`, ...)
    pub id: String,

    /// Always `"function"`
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,

    /// The invoked function
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

impl ChatToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name and JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,

    /// Arguments as JSON text
    pub arguments: String,
}

/// One fine-tuning example: a full conversation plus tool schemas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    /// Ordered messages
    pub messages: Vec<ChatMessage>,

    /// Tool schemas offered to the model (present iff tools were requested)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,

    /// The agent only ever issues one call at a time
    #[serde(default)]
    pub parallel_tool_calls: bool,
}

impl TrainingExample {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            tools: None,
            parallel_tool_calls: false,
        }
    }

    /// Number of tool-role messages.
    pub fn tool_response_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::Tool)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assistant_without_tool_calls_omits_key() {
        let json = serde_json::to_value(ChatMessage::assistant("Sure.", 1)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "assistant", "content": "Sure.", "weight": 1})
        );
    }

    #[test]
    fn tool_call_serializes_type_field() {
        let mut msg = ChatMessage::assistant("", 1);
        msg.content = None;
        msg.tool_calls
            .push(ChatToolCall::function("call_001", "end_call", "{}"));
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"role":"assistant","weight":1,"tool_calls":[{"id":"call_001","type":"function","function":{"name":"end_call","arguments":"{}"}}]}"#
        );
    }

    #[test]
    fn example_field_order() {
        let example = TrainingExample::new(vec![ChatMessage::user("Hi")]);
        let json = serde_json::to_string(&example).unwrap();
        assert_eq!(
            json,
            r#"{"messages":[{"role":"user","content":"Hi"}],"parallel_tool_calls":false}"#
        );
    }

    #[test]
    fn tool_result_parses_back() {
        let line = r#"{"role":"tool","tool_call_id":"call_002","content":"{\"ok\":true}"}"#;
        let msg: ChatMessage = serde_json::from_str(line).unwrap();
        assert_eq!(msg.role, ChatRole::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_002"));
        assert_eq!(msg.text(), r#"{"ok":true}"#);
    }
}
