use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use coach_core::{GeminiClient, SessionController};
use shared::domain::GreetingSource;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod repl;

use config::load_settings;

/// Walks a teacher through designing a project-based curriculum.
#[derive(Parser, Debug)]
#[command(name = "coach", version)]
struct Args {
    /// Settings file (defaults to ./coach.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    model: Option<String>,
    /// `external` asks the model for the greeting, `canned` greets locally.
    #[arg(long)]
    start_greeting: Option<GreetingSource>,
    #[arg(long)]
    restart_greeting: Option<GreetingSource>,
    /// Write the finished plan as HTML to this path.
    #[arg(long)]
    export: Option<PathBuf>,
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(model) = args.model {
        settings.model = model;
    }
    if let Some(source) = args.start_greeting {
        settings.start_greeting = source;
    }
    if let Some(source) = args.restart_greeting {
        settings.restart_greeting = source;
    }
    info!(
        model = %settings.model,
        start_greeting = ?settings.start_greeting,
        restart_greeting = ?settings.restart_greeting,
        "settings loaded"
    );

    let client = GeminiClient::new(settings.gemini_config()?)
        .context("failed to build completion client")?;
    let controller = SessionController::new(Arc::new(client), settings.session_config());

    repl::run(controller, args.export).await
}
