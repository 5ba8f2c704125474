//! A read-only bundle of annotation state for one export request.
//!
//! The surrounding application takes a consistent snapshot of its store and
//! hands it over as JSON. Loading checks the overlay invariants up front so
//! the engine can rely on them.

use crate::conversation::Conversation;
use crate::error::{Result, SnapshotError};
use crate::prompt::{PromptLibrary, SystemPrompt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Conversations plus system prompts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub conversations: Vec<Conversation>,

    #[serde(default)]
    pub prompts: Vec<SystemPrompt>,
}

impl Snapshot {
    /// Parse and validate a snapshot from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(text)?;
        snapshot.validate()?;
        tracing::debug!(
            conversations = snapshot.conversations.len(),
            prompts = snapshot.prompts.len(),
            "Snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Check snapshot-wide and per-conversation invariants.
    pub fn validate(&self) -> std::result::Result<(), SnapshotError> {
        let active = self.prompts.iter().filter(|p| p.active).count();
        if active > 1 {
            return Err(SnapshotError::MultipleActivePrompts { count: active });
        }

        let mut ids = HashSet::with_capacity(self.conversations.len());
        for conv in &self.conversations {
            if !ids.insert(conv.id.as_str()) {
                return Err(SnapshotError::DuplicateConversation(conv.id.clone()));
            }
            conv.check_invariants()?;
        }
        Ok(())
    }

    /// The prompts as a single-active library.
    pub fn prompt_library(&self) -> PromptLibrary {
        PromptLibrary::from_prompts(self.prompts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn loads_valid_snapshot() {
        let text = r#"{
            "conversations": [
                {"id": "c1", "agent_id": "a", "status": "approved",
                 "turns": [{"position": 0, "role": "user", "text": {"original": "Hi"}}]}
            ],
            "prompts": [
                {"id": "p1", "name": "v1", "content": "Be helpful.", "active": true}
            ]
        }"#;
        let snapshot = Snapshot::from_json(text).unwrap();
        assert_eq!(snapshot.conversations.len(), 1);
        assert_eq!(
            snapshot.prompt_library().active().map(|p| p.content.as_str()),
            Some("Be helpful.")
        );
    }

    #[test]
    fn rejects_two_active_prompts() {
        let text = r#"{"prompts": [
            {"id": "p1", "name": "v1", "content": "a", "active": true},
            {"id": "p2", "name": "v2", "content": "b", "active": true}
        ]}"#;
        let err = Snapshot::from_json(text).unwrap_err();
        assert!(matches!(
            err,
            Error::Snapshot(SnapshotError::MultipleActivePrompts { count: 2 })
        ));
    }

    #[test]
    fn rejects_duplicate_conversations() {
        let text = r#"{"conversations": [
            {"id": "c1", "agent_id": "a"},
            {"id": "c1", "agent_id": "b"}
        ]}"#;
        assert!(matches!(
            Snapshot::from_json(text),
            Err(Error::Snapshot(SnapshotError::DuplicateConversation(id))) if id == "c1"
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(Error::Serialization(_))
        ));
    }
}
