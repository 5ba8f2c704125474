//! System prompts and the single-active prompt library.
//!
//! At most one prompt is active at any time. The export engine never looks
//! the active prompt up itself; callers resolve it here and pass it in.

use crate::error::OverlayError;
use serde::{Deserialize, Serialize};

/// A reusable instruction text for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPrompt {
    /// Stable identifier
    pub id: String,

    /// Label for this prompt version
    pub name: String,

    /// The full prompt text
    pub content: String,

    /// Agent this prompt was written for, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    /// Whether this is the active prompt
    #[serde(default)]
    pub active: bool,
}

impl SystemPrompt {
    pub fn new(id: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            agent_id: None,
            active: false,
        }
    }
}

/// Holds prompt versions and enforces the single-active invariant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptLibrary {
    prompts: Vec<SystemPrompt>,
}

impl PromptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from loaded prompts. If several are flagged active,
    /// only the last one stays active.
    pub fn from_prompts(prompts: Vec<SystemPrompt>) -> Self {
        let mut library = Self::new();
        for prompt in prompts {
            library.add(prompt);
        }
        library
    }

    /// Add a prompt. Adding an active prompt deactivates all others.
    pub fn add(&mut self, prompt: SystemPrompt) {
        if prompt.active {
            self.deactivate_all();
        }
        self.prompts.retain(|p| p.id != prompt.id);
        self.prompts.push(prompt);
    }

    /// Make `id` the only active prompt.
    pub fn activate(&mut self, id: &str) -> Result<(), OverlayError> {
        if !self.prompts.iter().any(|p| p.id == id) {
            return Err(OverlayError::UnknownPrompt(id.to_string()));
        }
        for prompt in &mut self.prompts {
            prompt.active = prompt.id == id;
        }
        Ok(())
    }

    pub fn deactivate_all(&mut self) {
        for prompt in &mut self.prompts {
            prompt.active = false;
        }
    }

    /// The currently active prompt, if any.
    pub fn active(&self) -> Option<&SystemPrompt> {
        self.prompts.iter().find(|p| p.active)
    }

    pub fn get(&self, id: &str) -> Option<&SystemPrompt> {
        self.prompts.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemPrompt> {
        self.prompts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(id: &str) -> SystemPrompt {
        SystemPrompt {
            active: true,
            ..SystemPrompt::new(id, id, format!("prompt {id}"))
        }
    }

    #[test]
    fn only_one_active() {
        let mut library = PromptLibrary::new();
        library.add(active("v1"));
        library.add(active("v2"));
        assert_eq!(library.active().map(|p| p.id.as_str()), Some("v2"));
        assert!(!library.get("v1").unwrap().active);
    }

    #[test]
    fn activate_switches_prompt() {
        let mut library = PromptLibrary::from_prompts(vec![
            active("v1"),
            SystemPrompt::new("v2", "second", "prompt 2"),
        ]);
        library.activate("v2").unwrap();
        assert_eq!(library.active().unwrap().content, "prompt 2");
        assert_eq!(library.iter().filter(|p| p.active).count(), 1);
    }

    #[test]
    fn activate_unknown_fails() {
        let mut library = PromptLibrary::new();
        assert_eq!(
            library.activate("nope"),
            Err(OverlayError::UnknownPrompt("nope".into()))
        );
    }

    #[test]
    fn no_active_prompt() {
        let mut library = PromptLibrary::from_prompts(vec![active("v1")]);
        library.deactivate_all();
        assert!(library.active().is_none());
        assert_eq!(library.len(), 1);
    }
}
