//! `vibeforge serve`: start the browser-facing gateway.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("vibeforge gateway");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model.model);
    match &config.bridge.url {
        Some(url) => println!("   Tools:     remote bridge at {url}"),
        None => println!("   Tools:     embedded"),
    }

    vibeforge_gateway::start(config).await?;

    Ok(())
}
