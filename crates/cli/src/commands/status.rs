//! `callmill status` — Show configuration.

use callmill_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let on_off = |b: bool| if b { "on" } else { "off" };

    println!("📞 callmill Status");
    println!("==================");
    println!("  Config dir:      {}", AppConfig::config_dir().display());
    println!("  System prompt:   {}", on_off(config.export.include_system_prompt));
    println!("  Tools:           {}", on_off(config.export.include_tools));
    println!("  Context:         {}", on_off(config.export.include_context));
    println!("  Tool calls only: {}", on_off(config.export.tool_calls_only));
    println!("  Model:           {}", config.training.model);
    println!("  Epochs:          {}", config.training.epochs);
    println!("  Train ratio:     {}", config.split.train_ratio);
    match config.split.seed {
        Some(seed) => println!("  Split seed:      {seed}"),
        None => println!("  Split seed:      random"),
    }
    println!("  Chars/token:     {}", config.tokenizer.chars_per_token);
    println!("  Max tokens:      {}", config.validation.max_example_tokens);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults. Create one with:\n");
        println!("{}", AppConfig::default_toml());
    }

    Ok(())
}
