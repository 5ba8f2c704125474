//! callmill CLI — the main entry point.
//!
//! Commands:
//! - `export`        — Export approved conversations to JSONL
//! - `preview`       — Print the first few examples of an export
//! - `validate`      — Validate an existing JSONL file
//! - `estimate`      — Token count and training cost of a JSONL file
//! - `audit-context` — Check retrieval-context placement in an export
//! - `tools`         — List the tool catalog attached to examples
//! - `status`        — Show configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ExportArgs;

#[derive(Parser)]
#[command(
    name = "callmill",
    about = "callmill — annotated voice-agent calls to fine-tuning JSONL",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export approved conversations from a snapshot
    Export {
        #[command(flatten)]
        args: ExportArgs,

        /// Directory to write the JSONL files into
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Write train.jsonl and validation.jsonl instead of one file
        #[arg(long)]
        split: bool,

        /// Train fraction for --split (defaults to config)
        #[arg(long)]
        ratio: Option<f64>,

        /// Shuffle seed for --split (defaults to config)
        #[arg(long)]
        seed: Option<u64>,

        /// Also write the export summary as JSON to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Print the first examples an export would produce
    Preview {
        #[command(flatten)]
        args: ExportArgs,

        /// Number of examples to show
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,

        /// Truncate each example to this many characters
        #[arg(long, default_value_t = 2000)]
        max_chars: usize,
    },

    /// Validate an existing JSONL training file
    Validate {
        /// Path to the JSONL file
        file: PathBuf,
    },

    /// Estimate tokens and training cost of a JSONL file
    Estimate {
        /// Path to the JSONL file
        file: PathBuf,

        /// Model to price (defaults to config)
        #[arg(short, long)]
        model: Option<String>,

        /// Training epochs (defaults to config)
        #[arg(short, long)]
        epochs: Option<u32>,
    },

    /// Export with retrieval context and audit where it landed
    AuditContext {
        #[command(flatten)]
        args: ExportArgs,
    },

    /// List the tool schemas attached to training examples
    Tools {
        /// Print the full JSON schemas
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Export {
            args,
            output,
            split,
            ratio,
            seed,
            summary,
        } => commands::export::run(args, output, split, ratio, seed, summary).await?,
        Commands::Preview {
            args,
            count,
            max_chars,
        } => commands::preview::run(args, count, max_chars).await?,
        Commands::Validate { file } => commands::validate::run(file).await?,
        Commands::Estimate {
            file,
            model,
            epochs,
        } => commands::estimate::run(file, model, epochs).await?,
        Commands::AuditContext { args } => commands::audit_context::run(args).await?,
        Commands::Tools { json } => commands::tools::run(json).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
