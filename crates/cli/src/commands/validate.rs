//! `callmill validate` — Validate an existing JSONL training file.

use super::{print_list, validator_config};
use callmill_config::AppConfig;
use callmill_estimate::HeuristicTokenizer;
use callmill_export::{jsonl, Validator};
use std::path::PathBuf;

pub async fn run(file: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let text = std::fs::read_to_string(&file)
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;

    let tokenizer = HeuristicTokenizer::new(config.tokenizer.chars_per_token)?;
    let validator = Validator::new(validator_config(&config), &tokenizer);
    let report = jsonl::validate_jsonl(&text, &validator);

    println!("🔍 Validation: {}", file.display());
    println!("─────────────────────────────────────");
    println!("  Lines:    {}", report.line_count());
    println!("  Valid:    {}", report.examples.len());
    println!("  Invalid:  {}", report.invalid.len());
    println!("  Tokens:   ~{}", report.total_tokens);

    let problems: Vec<String> = report
        .invalid
        .iter()
        .flat_map(|l| l.errors.iter().map(move |e| format!("line {}: {e}", l.line)))
        .collect();
    print_list("Errors", &problems);
    print_list("Warnings", &report.warnings);

    if report.is_valid() {
        println!("\n  ✅ File is valid");
        Ok(())
    } else {
        Err(format!("{} invalid line(s)", report.invalid.len()).into())
    }
}
