//! Curio CLI entry point.

use anyhow::Result;
use clap::Parser;
use curio::cli::{commands, Cli, Commands};
use curio::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = match &cli.config {
        Some(path) => Settings::load_from(Some(&Settings::expand_path(path)))?,
        None => Settings::load()?,
    };

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("curio={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match &cli.command {
        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Ask {
            question,
            model,
            fast,
        } => {
            commands::run_ask(question, model.clone(), *fast, settings).await?;
        }

        Commands::Chat { model, fast } => {
            commands::run_chat(model.clone(), *fast, settings).await?;
        }

        Commands::Calc { expression } => {
            commands::run_calc(expression)?;
        }

        Commands::Search { query, limit } => {
            commands::run_search(query, *limit, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, cli.config.as_deref(), settings)?;
        }
    }

    Ok(())
}
