//! `vibeforge init`: write a default config file.

use vibeforge_config::AppConfig;

pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    }

    if config_path.exists() && !force {
        println!("Config already exists: {}", config_path.display());
        println!("Re-run with --force to overwrite.");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("Wrote {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set OPENAI_API_KEY (or model.api_key in the file)");
    println!("  2. Point storage, vector and object_store at your backends");
    println!("  3. vibeforge doctor");
    println!("  4. vibeforge serve");

    Ok(())
}
