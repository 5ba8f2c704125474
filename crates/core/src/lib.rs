//! # callmill Core
//!
//! Domain types for turning annotated voice-agent calls into fine-tuning data.
//! This crate has **no engine logic** — it defines the annotation overlay
//! model that the export engine reads, and the chat-format message types it
//! writes.
//!
//! ## Layout
//!
//! - [`conversation`] — imported calls, turns, tool calls, and the human
//!   overlay (edits, soft-deletes, insertions, weight overrides)
//! - [`overlay`] — the `original + edited` value-resolution helper
//! - [`prompt`] — system prompts and the single-active prompt library
//! - [`message`] — the training example wire format
//! - [`tool`] — tool schema types and the ordered catalog
//! - [`snapshot`] — a read-only bundle of annotation state for one export

pub mod error;
pub mod overlay;
pub mod conversation;
pub mod prompt;
pub mod message;
pub mod tool;
pub mod snapshot;

// Re-export key types at crate root for ergonomics
pub use error::{Error, OverlayError, Result, SnapshotError};
pub use overlay::Layered;
pub use conversation::{
    ContextSnippet, Conversation, ConversationStatus, ResponseStatus, Speaker, ToolCall, Turn,
    Weight,
};
pub use prompt::{PromptLibrary, SystemPrompt};
pub use message::{ChatMessage, ChatRole, ChatToolCall, FunctionCall, TrainingExample};
pub use tool::{Tool, ToolCatalog, ToolDefinition};
pub use snapshot::Snapshot;
