//! `callmill tools` — List the tool catalog.

use callmill_tools::default_catalog;

pub async fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = default_catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog.definitions())?);
        return Ok(());
    }

    println!("🔧 Tool Catalog (version {})", catalog.version());
    println!("─────────────────────────────────────────────────────");
    for def in catalog.definitions() {
        let required = def.required_parameters();
        println!("  {:<20} {}", def.name(), def.function.description);
        if !required.is_empty() {
            println!("  {:<20} required: {}", "", required.join(", "));
        }
    }
    println!();
    println!("  {} tools", catalog.len());
    Ok(())
}
