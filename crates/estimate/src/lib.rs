//! Token counting, training cost estimation, and dataset splitting.
//!
//! Everything here runs over already-validated examples. Token counts come
//! from one [`Tokenizer`] shared by the whole export, so repeated runs on the
//! same input produce the same numbers; cost comes from a static price table,
//! never a live pricing API.

pub mod pricing;
pub mod split;
pub mod token;

pub use pricing::{CostEstimate, PricingTable, DEFAULT_EPOCHS, DEFAULT_MODEL};
pub use split::{split_train_validation, split_with_rng, train_size, Split, DEFAULT_TRAIN_RATIO};
pub use token::{count_dataset_tokens, count_example_tokens, HeuristicTokenizer, Tokenizer};

/// Errors from the estimation subsystem.
#[derive(Debug, thiserror::Error)]
pub enum EstimateError {
    #[error("no training price for model '{0}'")]
    UnknownModel(String),

    #[error("train ratio must be in (0, 1], got {0}")]
    InvalidRatio(f64),

    #[error("chars_per_token must be greater than zero")]
    InvalidTokenizer,

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}
