//! `callmill preview` — Print the first examples of an export.

use super::{build_pipeline, load_snapshot, ExportArgs};
use callmill_config::AppConfig;
use callmill_export::jsonl;

pub async fn run(
    args: ExportArgs,
    count: usize,
    max_chars: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let snapshot = load_snapshot(&args.snapshot)?;
    let report = build_pipeline(&config, &args)?.run(&snapshot)?;

    print!(
        "{}",
        jsonl::preview(&report.training_examples(), count, max_chars)?
    );
    println!(
        "\n  {} exported, {} excluded, ~{} tokens",
        report.examples.len(),
        report.excluded_count(),
        report.total_tokens
    );
    Ok(())
}
