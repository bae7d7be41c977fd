//! vibeforge CLI, the main entry point.
//!
//! Commands:
//! - `serve`   Start the browser-facing gateway
//! - `bridge`  Start the tool bridge HTTP shim
//! - `run`     Plan a single prompt and print its trace
//! - `tools`   List the tools offered to the model
//! - `doctor`  Diagnose configuration and backends
//! - `init`    Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "vibeforge",
    about = "vibeforge: LLM tool-call orchestration with a streaming gateway",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start the tool bridge HTTP shim
    Bridge {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one prompt and print the trace to stdout
    Run {
        /// What to build
        #[arg(short, long)]
        prompt: String,
    },

    /// List the tools offered to the model
    Tools,

    /// Diagnose configuration and backends
    Doctor,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so `run` output stays a clean trace.
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json {
        builder.json().init();
    } else {
        builder.init();
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Bridge { port } => commands::bridge::run(port).await?,
        Commands::Run { prompt } => commands::run::run(prompt).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
        Commands::Init { force } => commands::init::run(force).await?,
    }

    Ok(())
}
