//! `vibeforge bridge`: expose the tool registry over HTTP.

use std::sync::Arc;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.bridge.port = port;
    }

    let embedder = vibeforge_providers::build_from_config(&config);
    let registry = vibeforge_bridge::build_from_config(&config, embedder).await?;

    println!("vibeforge tool bridge");
    println!("   Listening: http://{}:{}", config.bridge.host, config.bridge.port);
    for (kind, ready) in registry.availability() {
        let mark = if ready { "ready" } else { "not configured" };
        println!("   {:<18} {mark}", kind.name());
    }

    vibeforge_bridge::server::start(Arc::new(registry), &config.bridge.host, config.bridge.port)
        .await?;

    Ok(())
}
