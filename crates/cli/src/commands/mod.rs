//! Subcommand implementations and the config → engine wiring they share.

pub mod audit_context;
pub mod estimate;
pub mod export;
pub mod preview;
pub mod status;
pub mod tools;
pub mod validate;

use callmill_config::AppConfig;
use callmill_core::Snapshot;
use callmill_estimate::{HeuristicTokenizer, PricingTable};
use callmill_export::{ExportFilter, ExportOptions, ExportPipeline, ValidatorConfig};
use std::path::{Path, PathBuf};

/// Snapshot input plus export flags. Flags override `[export]` config.
#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Path to the snapshot JSON
    pub snapshot: PathBuf,

    /// Leave out the system prompt
    #[arg(long)]
    pub no_system_prompt: bool,

    /// Leave out the tool catalog
    #[arg(long)]
    pub no_tools: bool,

    /// Append retrieved context to user messages
    #[arg(long)]
    pub context: bool,

    /// Only export conversations with at least one tool call
    #[arg(long)]
    pub tool_calls_only: bool,

    /// Only export this agent's conversations
    #[arg(long)]
    pub agent: Option<String>,

    /// Only export conversations with this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Export at most this many conversations
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn export_options(config: &AppConfig, args: &ExportArgs) -> ExportOptions {
    ExportOptions {
        include_system_prompt: config.export.include_system_prompt && !args.no_system_prompt,
        include_tools: config.export.include_tools && !args.no_tools,
        include_context: config.export.include_context || args.context,
        tool_calls_only: config.export.tool_calls_only || args.tool_calls_only,
    }
}

pub fn export_filter(config: &AppConfig, args: &ExportArgs) -> ExportFilter {
    ExportFilter {
        agent_id: args.agent.clone().or_else(|| config.export.agent_id.clone()),
        tag: args.tag.clone().or_else(|| config.export.tag.clone()),
        limit: args.limit.or(config.export.limit),
    }
}

pub fn pricing_table(config: &AppConfig) -> PricingTable {
    let mut table = PricingTable::with_defaults();
    for (model, price) in &config.training.custom_pricing {
        table.set(model.clone(), *price);
    }
    table
}

pub fn validator_config(config: &AppConfig) -> ValidatorConfig {
    ValidatorConfig {
        max_example_tokens: config.validation.max_example_tokens,
        min_dataset_examples: config.validation.min_dataset_examples,
    }
}

/// An export pipeline configured from `config` and `args`.
pub fn build_pipeline(
    config: &AppConfig,
    args: &ExportArgs,
) -> Result<ExportPipeline, Box<dyn std::error::Error>> {
    let tokenizer = HeuristicTokenizer::new(config.tokenizer.chars_per_token)?;
    Ok(ExportPipeline::new(export_options(config, args))
        .with_filter(export_filter(config, args))
        .with_validator_config(validator_config(config))
        .with_tokenizer(Box::new(tokenizer))
        .with_pricing(pricing_table(config))
        .with_training(config.training.model.clone(), config.training.epochs))
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read snapshot {}: {e}", path.display()))?;
    Ok(Snapshot::from_json(&text)?)
}

/// Print a list under a heading, or nothing when empty.
pub fn print_list(heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("  {heading}:");
    for item in items {
        println!("    - {item}");
    }
}
