//! # callmill Export
//!
//! Turns annotated conversations into validated fine-tuning examples.
//!
//! Assembly is a pure function of one conversation, the export options and
//! the active system prompt: it never mutates the overlay and produces the
//! same bytes for the same input. The batch [`pipeline`] runs assembly and
//! validation across a snapshot in parallel and hands the survivors to the
//! estimator.
//!
//! ## Layout
//!
//! - [`weight`] — default training weight policy
//! - [`context`] — retrieval-context injection into user messages, and audit
//! - [`call_id`] — sequential `call_NNN` identifiers
//! - [`assembler`] — one conversation → one training example
//! - [`validator`] — structural checks, collect-all
//! - [`pipeline`] — filters, parallel batch export, summary
//! - [`jsonl`] — serialization, downloads, file validation, preview

pub mod assembler;
pub mod call_id;
pub mod context;
pub mod jsonl;
pub mod pipeline;
pub mod validator;
pub mod weight;

use serde::{Deserialize, Serialize};

pub use assembler::{assemble, Assembler, Assembly, SkipReason};
pub use call_id::CallIdAllocator;
pub use context::{audit_context, ContextAudit, CONTEXT_HEADER};
pub use jsonl::{to_jsonl, DownloadBundle, JsonlReport};
pub use pipeline::{ExportFilter, ExportPipeline, ExportReport, ExportSummary, Exclusion};
pub use validator::{ValidationIssue, ValidationReport, Validator, ValidatorConfig};
pub use weight::WeightPolicy;

/// What an export includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Prepend the active system prompt
    pub include_system_prompt: bool,

    /// Attach the full tool catalog to every example
    pub include_tools: bool,

    /// Append retrieved context to user messages
    pub include_context: bool,

    /// Skip conversations that emit no tool call
    pub tool_calls_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_system_prompt: true,
            include_tools: true,
            include_context: false,
            tool_calls_only: false,
        }
    }
}

/// Errors that abort an export request.
///
/// Per-example problems are not errors; they are reported as exclusions.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("system prompt requested but no prompt is active")]
    NoActivePrompt,

    #[error("no approved conversations match the export filter")]
    NoEligibleConversations,

    #[error("estimation failed: {0}")]
    Estimate(#[from] callmill_estimate::EstimateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
