//! `callmill audit-context` — Check where retrieval context landed.

use super::{build_pipeline, load_snapshot, print_list, ExportArgs};
use callmill_config::AppConfig;
use callmill_export::audit_context;

pub async fn run(mut args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    args.context = true;
    let config = AppConfig::load()?;
    let snapshot = load_snapshot(&args.snapshot)?;
    let report = build_pipeline(&config, &args)?.run(&snapshot)?;

    let with_context = snapshot
        .conversations
        .iter()
        .filter(|c| c.is_approved())
        .filter(|c| {
            c.surviving_turns()
                .iter()
                .any(|t| t.is_agent() && !t.context.is_empty())
        })
        .count();
    let audit = audit_context(&report.training_examples());

    println!("🧭 Context Audit");
    println!("─────────────────────────────────────");
    println!("  Approved conversations with context: {with_context}");
    println!("  Examples:                            {}", audit.examples);
    println!("  Examples with context:               {}", audit.examples_with_context);
    println!("  Context blocks:                      {}", audit.context_blocks);
    print_list("Issues", &audit.issues);

    if audit.is_clean() {
        println!("\n  ✅ Context placement is correct");
        Ok(())
    } else {
        Err(format!("{} context issue(s)", audit.issues.len()).into())
    }
}
