//! Built-in fine-tuning price table.
//!
//! Prices are in USD per 1 million *training* tokens. Training tokens are
//! dataset tokens multiplied by the number of epochs. Custom prices can be
//! added from config.

use crate::EstimateError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Model priced by default.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Epochs assumed when the caller does not say otherwise.
pub const DEFAULT_EPOCHS: u32 = 3;

/// A cost estimate for one fine-tuning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub model: String,
    /// Tokens in the dataset (one pass).
    pub tokens: usize,
    pub epochs: u32,
    pub price_per_million: f64,
    /// `tokens × epochs`
    pub training_tokens: u64,
    /// Estimated cost in USD, rounded to cents.
    pub cost_usd: f64,
}

/// `tokens × epochs × price_per_million / 1M`, rounded to cents.
pub fn estimate_training_cost(tokens: usize, epochs: u32, price_per_million: f64) -> f64 {
    let training_tokens = tokens as f64 * f64::from(epochs);
    let cost = training_tokens / 1_000_000.0 * price_per_million;
    (cost * 100.0).round() / 100.0
}

/// Training price lookup with built-in defaults and custom overrides.
#[derive(Debug, Clone)]
pub struct PricingTable {
    prices: HashMap<String, f64>,
}

impl PricingTable {
    /// Create a pricing table with built-in model prices.
    pub fn with_defaults() -> Self {
        let mut prices = HashMap::new();

        // ── OpenAI supervised fine-tuning ──────────────────────────
        prices.insert("gpt-4o".into(), 25.0);
        prices.insert("gpt-4o-mini".into(), 3.0);
        prices.insert("gpt-4.1".into(), 25.0);
        prices.insert("gpt-4.1-mini".into(), 5.0);
        prices.insert("gpt-4.1-nano".into(), 1.5);
        prices.insert("gpt-3.5-turbo".into(), 8.0);

        Self { prices }
    }

    /// Create an empty pricing table.
    pub fn empty() -> Self {
        Self {
            prices: HashMap::new(),
        }
    }

    /// Add or update the price for a model.
    pub fn set(&mut self, model: impl Into<String>, per_million: f64) {
        self.prices.insert(model.into(), per_million);
    }

    /// Price per 1M training tokens for a model.
    ///
    /// Tries an exact match, then the name without a provider prefix
    /// (`openai/gpt-4o` → `gpt-4o`), then the longest known name that
    /// prefixes the model (`gpt-4o-mini-2024-07-18` → `gpt-4o-mini`).
    pub fn price_for(&self, model: &str) -> Option<f64> {
        if let Some(p) = self.prices.get(model) {
            return Some(*p);
        }

        let lower = model.to_lowercase();
        let bare = lower.rsplit('/').next().unwrap_or(&lower);
        if let Some(p) = self.prices.get(bare) {
            return Some(*p);
        }

        self.prices
            .iter()
            .filter(|(key, _)| bare.starts_with(&key.to_lowercase()))
            .max_by_key(|(key, _)| key.len())
            .map(|(_, p)| *p)
    }

    /// Estimate the cost of training `model` on `tokens` for `epochs`.
    pub fn estimate(
        &self,
        model: &str,
        tokens: usize,
        epochs: u32,
    ) -> Result<CostEstimate, EstimateError> {
        let price = self
            .price_for(model)
            .ok_or_else(|| EstimateError::UnknownModel(model.to_string()))?;
        Ok(CostEstimate {
            model: model.to_string(),
            tokens,
            epochs,
            price_per_million: price,
            training_tokens: tokens as u64 * u64::from(epochs),
            cost_usd: estimate_training_cost(tokens, epochs, price),
        })
    }

    /// List all known model names, sorted.
    pub fn models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.prices.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of models in the pricing table.
    pub fn len(&self) -> usize {
        self.prices.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}
