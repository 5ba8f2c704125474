//! Retrieval-context injection.
//!
//! The agent saw knowledge-base chunks when it produced a turn; the model
//! being trained must see them too, so they are appended to the caller's
//! message that prompted the turn:
//!
//! ```text
//! {user text}\n\nContext:\n{chunk}\n{chunk}
//! ```
//!
//! Injection is planned in a first pass over the surviving turns and applied
//! while messages are built, so overlay text is never touched.

use callmill_core::{ChatRole, ContextSnippet, TrainingExample, Turn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Separator between a user message and an injected context block.
pub const CONTEXT_HEADER: &str = "\n\nContext:\n";

/// Join the non-blank snippets of one agent turn, in retrieval order.
///
/// Returns `None` when nothing non-blank remains.
pub fn context_block(snippets: &[ContextSnippet]) -> Option<String> {
    let parts: Vec<&str> = snippets
        .iter()
        .map(|s| s.content.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Context blocks to append, keyed by index into `turns`.
///
/// Each agent turn's block goes to the nearest preceding user turn in
/// `turns`. Several agent turns answering one user turn append several
/// blocks, in turn order. Blocks with no preceding user turn are dropped.
pub fn plan_injections(turns: &[&Turn]) -> BTreeMap<usize, Vec<String>> {
    let mut plan: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    let mut last_user: Option<usize> = None;

    for (idx, turn) in turns.iter().enumerate() {
        if turn.is_user() {
            last_user = Some(idx);
            continue;
        }
        let Some(block) = context_block(&turn.context) else {
            continue;
        };
        match last_user {
            Some(target) => plan.entry(target).or_default().push(block),
            None => debug!(
                position = turn.position,
                snippets = turn.context.len(),
                "Dropping context with no preceding user turn"
            ),
        }
    }
    plan
}

/// Append planned blocks to a user message's content.
pub fn inject(content: &mut String, blocks: &[String]) {
    for block in blocks {
        content.push_str(CONTEXT_HEADER);
        content.push_str(block);
    }
}

/// Structural audit of context blocks over exported examples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextAudit {
    /// Examples inspected
    pub examples: usize,

    /// Examples carrying at least one context block
    pub examples_with_context: usize,

    /// Messages carrying a context header
    pub context_blocks: usize,

    /// Findings, one line each; empty means the export is clean
    pub issues: Vec<String>,
}

impl ContextAudit {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Check that context appears only in user messages, has text on both sides
/// of the header, and is answered by an assistant message.
///
/// A message counts as one block however many blocks were stacked into it.
/// It is split at the first [`CONTEXT_HEADER`], so the user text is what
/// precedes every block. Blocks are found by the header text alone: a user
/// utterance that itself contains `"\n\nContext:\n"` is reported as
/// carrying context.
pub fn audit_context(examples: &[TrainingExample]) -> ContextAudit {
    let mut audit = ContextAudit {
        examples: examples.len(),
        ..ContextAudit::default()
    };

    for (i, example) in examples.iter().enumerate() {
        let mut has_context = false;

        for (j, msg) in example.messages.iter().enumerate() {
            let Some((user_text, rag_text)) = msg.text().split_once(CONTEXT_HEADER) else {
                continue;
            };
            audit.context_blocks += 1;
            has_context = true;

            if msg.role != ChatRole::User {
                audit
                    .issues
                    .push(format!("example {i}, message {j}: context block in {} message", msg.role));
            }
            if user_text.trim().is_empty() {
                audit
                    .issues
                    .push(format!("example {i}, message {j}: empty user text before context"));
            }
            if rag_text.trim().is_empty() {
                audit
                    .issues
                    .push(format!("example {i}, message {j}: empty context after header"));
            }
            match example.messages.get(j + 1) {
                Some(next) if next.role == ChatRole::Assistant => {}
                Some(next) => audit.issues.push(format!(
                    "example {i}, message {j}: context not followed by assistant (got {})",
                    next.role
                )),
                None => audit
                    .issues
                    .push(format!("example {i}, message {j}: context is the last message")),
            }
        }

        if has_context {
            audit.examples_with_context += 1;
        }
    }
    audit
}
