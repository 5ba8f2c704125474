//! `callmill export` — Export approved conversations to JSONL files.

use super::{build_pipeline, load_snapshot, print_list, ExportArgs};
use callmill_config::AppConfig;
use callmill_export::DownloadBundle;
use std::path::PathBuf;

pub async fn run(
    args: ExportArgs,
    output: PathBuf,
    split: bool,
    ratio: Option<f64>,
    seed: Option<u64>,
    summary_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let snapshot = load_snapshot(&args.snapshot)?;
    let pipeline = build_pipeline(&config, &args)?;
    let report = pipeline.run(&snapshot)?;

    let mut split_sizes = None;
    let bundle = if split {
        let ratio = ratio.unwrap_or(config.split.train_ratio);
        let sets = report.split(ratio, seed.or(config.split.seed))?;
        split_sizes = Some((sets.train.len(), sets.validation.len()));
        DownloadBundle::split(&sets)?
    } else {
        DownloadBundle::single(&report.training_examples())?
    };
    let written = bundle.write_to(&output)?;

    println!("📦 Export");
    println!("─────────────────────────────────────");
    println!("  Conversations: {}", report.conversation_count);
    println!("  Exported:      {}", report.examples.len());
    println!("  Excluded:      {}", report.excluded_count());
    println!("  Tokens:        ~{}", report.total_tokens);
    if let Some(est) = &report.estimate {
        println!(
            "  Est. cost:     ${:.2} ({} × {} epochs)",
            est.cost_usd, est.model, est.epochs
        );
    }
    if let Some((train, validation)) = split_sizes {
        println!("  Split:         {train} train / {validation} validation");
    }
    for path in &written {
        println!("  Wrote:         {}", path.display());
    }

    let exclusions: Vec<String> = report
        .excluded
        .iter()
        .map(|x| format!("{}: {}", x.conversation_id, x.reasons.join("; ")))
        .collect();
    print_list("Excluded", &exclusions);
    print_list("Warnings", &report.warnings);

    if let Some(path) = summary_path {
        let summary = report.summary(pipeline.options(), pipeline.filter());
        std::fs::write(&path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!(id = %summary.id, path = %path.display(), "Export summary written");
    }

    Ok(())
}
