//! Layered values: an immutable original plus an optional annotator edit.
//!
//! Every editable fact in the overlay model (turn text, tool-call arguments)
//! is stored as a [`Layered`] value and resolved at read time. Imported data
//! is never mutated in place.

use serde::{Deserialize, Serialize};

/// An original value with an optional edit that supersedes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layered<T> {
    /// Value as imported. Never changed after import.
    #[serde(default)]
    pub original: T,

    /// Annotator replacement, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited: Option<T>,
}

impl<T> Layered<T> {
    /// A value with no edit.
    pub fn new(original: T) -> Self {
        Self {
            original,
            edited: None,
        }
    }

    /// A value whose edit is authoritative from creation (inserted turns).
    pub fn authored(original: T, edited: T) -> Self {
        Self {
            original,
            edited: Some(edited),
        }
    }

    /// The edit when present, otherwise the original.
    pub fn resolve(&self) -> &T {
        self.edited.as_ref().unwrap_or(&self.original)
    }

    /// Whether an edit supersedes the original.
    pub fn is_edited(&self) -> bool {
        self.edited.is_some()
    }

    /// Replace the edit.
    pub fn edit(&mut self, value: T) {
        self.edited = Some(value);
    }

    /// Drop the edit, falling back to the original.
    pub fn revert(&mut self) {
        self.edited = None;
    }
}
