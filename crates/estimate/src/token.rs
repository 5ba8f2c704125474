//! Token estimation.
//!
//! The default tokenizer is a character heuristic: ~4 characters per token,
//! rounded up. It is applied to the serialized JSON line of each example,
//! which is what the training service bills for.

use crate::EstimateError;
use callmill_core::message::TrainingExample;

/// Token counting over text.
pub trait Tokenizer: Send + Sync {
    /// Count the number of tokens in the given text.
    fn count_tokens(&self, text: &str) -> usize;
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    fn count_tokens(&self, text: &str) -> usize {
        (*self).count_tokens(text)
    }
}

/// Characters-per-token heuristic tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeuristicTokenizer {
    chars_per_token: usize,
}

impl HeuristicTokenizer {
    pub const DEFAULT_CHARS_PER_TOKEN: usize = 4;

    pub fn new(chars_per_token: usize) -> Result<Self, EstimateError> {
        if chars_per_token == 0 {
            return Err(EstimateError::InvalidTokenizer);
        }
        Ok(Self { chars_per_token })
    }

    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for HeuristicTokenizer {
    fn default() -> Self {
        Self {
            chars_per_token: Self::DEFAULT_CHARS_PER_TOKEN,
        }
    }
}

impl Tokenizer for HeuristicTokenizer {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token)
    }
}

/// Tokens in one example's serialized JSON line.
pub fn count_example_tokens(
    tokenizer: &dyn Tokenizer,
    example: &TrainingExample,
) -> Result<usize, EstimateError> {
    let line = serde_json::to_string(example)?;
    Ok(tokenizer.count_tokens(&line))
}

/// Total tokens over a dataset.
pub fn count_dataset_tokens(
    tokenizer: &dyn Tokenizer,
    examples: &[TrainingExample],
) -> Result<usize, EstimateError> {
    examples
        .iter()
        .map(|e| count_example_tokens(tokenizer, e))
        .sum()
}
