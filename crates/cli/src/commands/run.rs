//! `vibeforge run`: plan one prompt in the terminal.

use tokio_util::sync::CancellationToken;
use vibeforge_agent::{Orchestrator, Termination, TraceSink};

pub async fn run(prompt: String) -> Result<(), Box<dyn std::error::Error>> {
    if prompt.trim().is_empty() {
        return Err("Missing prompt".into());
    }

    let config = super::load_config()?;
    let provider = vibeforge_providers::build_from_config(&config);
    let bridge = vibeforge_gateway::connect_bridge(&config, provider.clone()).await?;
    let orchestrator = Orchestrator::from_config(&config, provider, bridge);

    let (sink, mut rx) = TraceSink::channel();
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let run = tokio::spawn(async move { orchestrator.run(&prompt, &sink, &cancel).await });

    while let Some(event) = rx.recv().await {
        println!("{}", event.render());
    }

    let outcome = run.await?;
    tracing::debug!(
        termination = %outcome.termination,
        iterations = outcome.iterations,
        tool_calls = outcome.tool_calls,
        "Run complete"
    );

    match outcome.termination {
        Termination::Final => Ok(()),
        other => Err(format!("run ended: {other}").into()),
    }
}
