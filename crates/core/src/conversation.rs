//! Conversation, Turn and ToolCall — the annotation overlay model.
//!
//! An imported call is an immutable transcript. Annotators layer edits,
//! soft-deletes, inserted turns and weight overrides on top of it; nothing
//! imported is ever physically removed. The export engine reads this model
//! and never writes to it.

use crate::error::OverlayError;
use crate::overlay::Layered;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The caller (customer)
    User,
    /// The voice agent
    Agent,
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// Training weight on an assistant message: learn (1) or don't learn (0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weight {
    Zero,
    One,
}

impl Weight {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }
}

impl TryFrom<u8> for Weight {
    type Error = OverlayError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            other => Err(OverlayError::InvalidWeight(other)),
        }
    }
}

impl From<Weight> for u8 {
    fn from(w: Weight) -> Self {
        w.as_u8()
    }
}

/// Review lifecycle of a conversation. Only `Approved` is exportable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    #[default]
    Unassigned,
    Assigned,
    InProgress,
    Completed,
    Approved,
    Rejected,
    Flagged,
}

/// Outcome classification of a tool invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    #[default]
    Success,
    Error,
}

/// A knowledge-base chunk retrieved while the agent produced a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    /// Chunk text.
    pub content: String,

    /// Vector distance reported by the retriever (lower is closer).
    #[serde(default)]
    pub distance: f64,

    /// Source document, when the retriever reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl ContextSnippet {
    pub fn new(content: impl Into<String>, distance: f64) -> Self {
        Self {
            content: content.into(),
            distance,
            document_id: None,
        }
    }
}

/// One function invocation attributed to an agent turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Function name as reported by the voice platform
    pub name: String,

    /// Arguments; the original may be null, missing or unparseable text
    #[serde(default)]
    pub arguments: Layered<serde_json::Value>,

    /// Webhook response body (None = no recorded result)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,

    /// Success/error classification of the response
    #[serde(default)]
    pub status: ResponseStatus,

    /// HTTP status code of the webhook call, if recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    /// Soft-delete flag; removes the call and its response together
    #[serde(default)]
    pub deleted: bool,
}

impl ToolCall {
    /// Create a call with original arguments and no response.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments: Layered::new(arguments),
            response: None,
            status: ResponseStatus::Success,
            status_code: None,
            deleted: false,
        }
    }

    /// Attach a recorded response.
    pub fn with_response(mut self, response: serde_json::Value) -> Self {
        self.response = Some(response);
        self
    }

    /// Mark the response as an error.
    pub fn with_error_status(mut self, status_code: u16) -> Self {
        self.status = ResponseStatus::Error;
        self.status_code = Some(status_code);
        self
    }

    /// Replace the arguments with an annotator correction.
    pub fn edit_arguments(&mut self, arguments: serde_json::Value) {
        self.arguments.edit(arguments);
    }

    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }

    pub fn restore(&mut self) {
        self.deleted = false;
    }

    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }
}

/// One utterance in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Order within the conversation; unique, gaps allowed
    pub position: i64,

    /// Who spoke
    pub role: Speaker,

    /// Transcript text with optional annotator edit
    #[serde(default)]
    pub text: Layered<String>,

    /// Soft-delete flag; the turn is kept but never exported
    #[serde(default)]
    pub deleted: bool,

    /// True for turns authored by an annotator rather than imported
    #[serde(default)]
    pub inserted: bool,

    /// Weight override (agent turns only); None = default policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,

    /// Retrieved knowledge-base chunks, in retrieval order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextSnippet>,

    /// Function invocations made during this turn (agent turns only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Offset of the utterance within the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_in_call_secs: Option<f64>,
}

impl Turn {
    fn imported(position: i64, role: Speaker, text: impl Into<String>) -> Self {
        Self {
            position,
            role,
            text: Layered::new(text.into()),
            deleted: false,
            inserted: false,
            weight: None,
            context: Vec::new(),
            tool_calls: Vec::new(),
            time_in_call_secs: None,
        }
    }

    /// An imported caller turn.
    pub fn user(position: i64, text: impl Into<String>) -> Self {
        Self::imported(position, Speaker::User, text)
    }

    /// An imported agent turn.
    pub fn agent(position: i64, text: impl Into<String>) -> Self {
        Self::imported(position, Speaker::Agent, text)
    }

    /// An annotator-authored turn. It has no original text.
    pub fn inserted(position: i64, role: Speaker, text: impl Into<String>) -> Self {
        Self {
            text: Layered::authored(String::new(), text.into()),
            inserted: true,
            ..Self::imported(position, role, String::new())
        }
    }

    pub fn with_tool_call(mut self, call: ToolCall) -> Self {
        self.tool_calls.push(call);
        self
    }

    pub fn with_context(mut self, snippet: ContextSnippet) -> Self {
        self.context.push(snippet);
        self
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Speaker::User
    }

    pub fn is_agent(&self) -> bool {
        self.role == Speaker::Agent
    }

    /// Text to export: the edit when present, otherwise the original.
    pub fn display_text(&self) -> &str {
        self.text.resolve()
    }

    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.text.edit(text.into());
    }

    pub fn revert_text(&mut self) {
        self.text.revert();
    }

    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }

    pub fn restore(&mut self) {
        self.deleted = false;
    }

    /// Set or clear the weight override. User turns never carry weight.
    pub fn set_weight(&mut self, weight: Option<Weight>) -> Result<(), OverlayError> {
        if self.is_user() && weight.is_some() {
            return Err(OverlayError::WeightOnUserTurn {
                position: self.position,
            });
        }
        self.weight = weight;
        Ok(())
    }

    /// Soft-delete one tool call (and, with it, its response).
    pub fn delete_tool_call(&mut self, index: usize) -> Result<(), OverlayError> {
        let position = self.position;
        let call = self
            .tool_calls
            .get_mut(index)
            .ok_or(OverlayError::ToolCallNotFound { position, index })?;
        call.soft_delete();
        Ok(())
    }

    /// Tool calls that have not been soft-deleted, in recorded order.
    pub fn surviving_tool_calls(&self) -> impl Iterator<Item = &ToolCall> {
        self.tool_calls.iter().filter(|c| !c.deleted)
    }
}

/// One imported phone call plus its annotation overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Stable external identifier (voice platform conversation id)
    pub id: String,

    /// Voice agent the call belongs to
    pub agent_id: String,

    /// Review lifecycle status
    #[serde(default)]
    pub status: ConversationStatus,

    /// All turns, including soft-deleted and inserted ones
    #[serde(default)]
    pub turns: Vec<Turn>,

    /// When the call started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timestamp: Option<DateTime<Utc>>,

    /// Free-text annotator note
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,

    /// Tag names
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl Conversation {
    /// Create an empty, unassigned conversation.
    pub fn new(id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            status: ConversationStatus::Unassigned,
            turns: Vec::new(),
            call_timestamp: None,
            notes: String::new(),
            tags: BTreeSet::new(),
        }
    }

    pub fn with_status(mut self, status: ConversationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_turn(mut self, turn: Turn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Only approved conversations are eligible for export.
    pub fn is_approved(&self) -> bool {
        self.status == ConversationStatus::Approved
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Non-deleted turns in position order.
    pub fn surviving_turns(&self) -> Vec<&Turn> {
        let mut turns: Vec<&Turn> = self.turns.iter().filter(|t| !t.deleted).collect();
        turns.sort_by_key(|t| t.position);
        turns
    }

    /// Whether any surviving agent turn still has a surviving tool call.
    pub fn has_surviving_tool_calls(&self) -> bool {
        self.turns
            .iter()
            .filter(|t| !t.deleted && t.is_agent())
            .any(|t| t.surviving_tool_calls().next().is_some())
    }

    /// Mutable access to the turn at `position`.
    pub fn turn_mut(&mut self, position: i64) -> Result<&mut Turn, OverlayError> {
        let conversation = self.id.clone();
        self.turns
            .iter_mut()
            .find(|t| t.position == position)
            .ok_or(OverlayError::TurnNotFound {
                conversation,
                position,
            })
    }

    /// Insert an annotator-authored turn after `after` (or at the start when
    /// `None`). Uses a free position gap when one exists; otherwise later
    /// turns are shifted by one. Returns the new turn's position.
    pub fn insert_turn(
        &mut self,
        after: Option<i64>,
        role: Speaker,
        text: impl Into<String>,
    ) -> Result<i64, OverlayError> {
        let mut positions: Vec<i64> = self.turns.iter().map(|t| t.position).collect();
        positions.sort_unstable();

        let position = match after {
            Some(prev) => {
                if !positions.contains(&prev) {
                    return Err(OverlayError::TurnNotFound {
                        conversation: self.id.clone(),
                        position: prev,
                    });
                }
                match positions.iter().copied().find(|&p| p > prev) {
                    None => prev + 1,
                    Some(next) if next - prev > 1 => prev + (next - prev) / 2,
                    Some(next) => {
                        self.shift_from(next);
                        next
                    }
                }
            }
            None => match positions.first().copied() {
                None => 0,
                Some(first) if first > 0 => first / 2,
                Some(first) => {
                    self.shift_from(first);
                    first
                }
            },
        };

        self.turns.push(Turn::inserted(position, role, text));
        self.turns.sort_by_key(|t| t.position);
        Ok(position)
    }

    fn shift_from(&mut self, from: i64) {
        for turn in self.turns.iter_mut().filter(|t| t.position >= from) {
            turn.position += 1;
        }
    }

    /// Check the overlay invariants: unique positions, and user turns carry
    /// neither weights nor tool calls.
    pub fn check_invariants(&self) -> Result<(), OverlayError> {
        let mut seen = HashSet::with_capacity(self.turns.len());
        for turn in &self.turns {
            if !seen.insert(turn.position) {
                return Err(OverlayError::DuplicatePosition {
                    conversation: self.id.clone(),
                    position: turn.position,
                });
            }
            if turn.is_user() {
                if turn.weight.is_some() {
                    return Err(OverlayError::WeightOnUserTurn {
                        position: turn.position,
                    });
                }
                if !turn.tool_calls.is_empty() {
                    return Err(OverlayError::ToolCallOnUserTurn {
                        position: turn.position,
                    });
                }
            }
        }
        Ok(())
    }
}
