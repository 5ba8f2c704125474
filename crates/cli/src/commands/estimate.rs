//! `callmill estimate` — Token count and training cost of a JSONL file.

use super::{pricing_table, validator_config};
use callmill_config::AppConfig;
use callmill_estimate::HeuristicTokenizer;
use callmill_export::{jsonl, Validator};
use std::path::PathBuf;

pub async fn run(
    file: PathBuf,
    model: Option<String>,
    epochs: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let text = std::fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let tokenizer = HeuristicTokenizer::new(config.tokenizer.chars_per_token)?;
    let validator = Validator::new(validator_config(&config), &tokenizer);
    let report = jsonl::validate_jsonl(&text, &validator);

    let model = model.unwrap_or_else(|| config.training.model.clone());
    let epochs = epochs.unwrap_or(config.training.epochs);
    let estimate = pricing_table(&config).estimate(&model, report.total_tokens, epochs)?;

    println!("💰 Training Estimate");
    println!("─────────────────────────────────────");
    println!("  Examples:        {}", report.examples.len());
    if !report.invalid.is_empty() {
        println!("  Skipped invalid: {}", report.invalid.len());
    }
    println!("  Tokens:          ~{}", estimate.tokens);
    println!("  Epochs:          {}", estimate.epochs);
    println!("  Training tokens: ~{}", estimate.training_tokens);
    println!(
        "  Model:           {} (${:.2}/1M)",
        estimate.model, estimate.price_per_million
    );
    println!("  Est. cost:       ${:.2}", estimate.cost_usd);
    Ok(())
}
