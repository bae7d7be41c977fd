//! `vibeforge doctor`: diagnose configuration and backends.

use std::time::Duration;

use vibeforge_config::AppConfig;
use vibeforge_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("vibeforge doctor");
    println!("================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  [ok]   Config file found at {}", config_path.display());
    } else {
        println!("  [info] No config file; using defaults and environment (run `vibeforge init`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  [ok]   Configuration valid");
            config
        }
        Err(e) => {
            println!("  [fail] Configuration invalid: {e}");
            return Ok(());
        }
    };

    let provider = vibeforge_providers::build_from_config(&config);
    if config.has_api_key() {
        match provider.health_check().await {
            Ok(true) => println!("  [ok]   Model endpoint reachable ({})", config.model.base_url),
            Ok(false) | Err(_) => {
                println!("  [fail] Model endpoint unreachable ({})", config.model.base_url);
                issues += 1;
            }
        }
    } else {
        println!("  [warn] No API key configured; set OPENAI_API_KEY");
        issues += 1;
    }

    match &config.bridge.url {
        Some(url) => {
            let bridge = vibeforge_bridge::HttpBridge::new(
                url,
                Duration::from_secs(config.model.request_timeout_secs),
            );
            match bridge.health().await {
                Ok(true) => println!("  [ok]   Tool bridge reachable at {url}"),
                _ => {
                    println!("  [fail] Tool bridge unreachable at {url}");
                    issues += 1;
                }
            }
        }
        None => match vibeforge_bridge::build_from_config(&config, provider).await {
            Ok(registry) => {
                for (kind, ready) in registry.availability() {
                    if ready {
                        println!("  [ok]   {} ready", kind.name());
                    } else {
                        println!("  [warn] {} has no backend configured", kind.name());
                        issues += 1;
                    }
                }
            }
            Err(e) => {
                println!("  [fail] Tool bridge could not be built: {e}");
                issues += 1;
            }
        },
    }

    println!();
    if issues == 0 {
        println!("  All checks passed!");
    } else {
        println!("  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
