//! Error types for the callmill domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for core operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Overlay errors ---
    #[error("Overlay error: {0}")]
    Overlay(#[from] OverlayError),

    // --- Snapshot errors ---
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Violations of the annotation overlay invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("Conversation {conversation}: duplicate turn position {position}")]
    DuplicatePosition { conversation: String, position: i64 },

    #[error("Conversation {conversation}: no turn at position {position}")]
    TurnNotFound { conversation: String, position: i64 },

    #[error("Turn {position}: user turns cannot carry a training weight")]
    WeightOnUserTurn { position: i64 },

    #[error("Turn {position}: user turns cannot carry tool calls")]
    ToolCallOnUserTurn { position: i64 },

    #[error("Turn {position}: no tool call at index {index}")]
    ToolCallNotFound { position: i64, index: usize },

    #[error("Invalid weight {0}: must be 0 or 1")]
    InvalidWeight(u8),

    #[error("Unknown system prompt: {0}")]
    UnknownPrompt(String),
}

/// Problems with a loaded annotation snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("{count} system prompts are marked active; at most one may be")]
    MultipleActivePrompts { count: usize },

    #[error("Duplicate conversation id: {0}")]
    DuplicateConversation(String),

    #[error("Invalid conversation: {0}")]
    InvalidConversation(#[from] OverlayError),
}
