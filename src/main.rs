// ABOUTME: Entry point for the hackhub binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and runs the server or a one-shot job.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hackhub_server::{AppState, HackhubConfig, Scheduler, create_router, jobs};

#[derive(Parser)]
#[command(name = "hackhub", version, about = "Aggregate hackathon listings into one store")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API and the interval scheduler (default).
    Serve,
    /// Fetch every configured source once and reconcile into the store.
    Scrape,
    /// Delete events whose end date has passed.
    Sweep,
    /// Print stored events as JSON.
    List {
        /// Only list events for this platform.
        #[arg(long)]
        platform: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("hackhub=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = HackhubConfig::from_env().context("invalid configuration")?;
    tracing::info!(db = %config.db_path.display(), "hackhub starting up");

    let state = Arc::new(AppState::from_config(&config).context("failed to initialize state")?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state, &config).await,
        Command::Scrape => {
            let report = jobs::run_scrape(&state).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Sweep => {
            let deleted = jobs::run_sweep(&state).await?;
            println!("{}", serde_json::json!({ "deleted": deleted }));
            Ok(())
        }
        Command::List { platform } => {
            let events = jobs::list_events(&state, platform).await?;
            println!("{}", serde_json::to_string_pretty(&events)?);
            Ok(())
        }
    }
}

async fn serve(state: Arc<AppState>, config: &HackhubConfig) -> anyhow::Result<()> {
    let scheduler = config.scheduler_enabled.then(|| {
        Scheduler::start(
            Arc::clone(&state),
            config.scrape_interval,
            config.sweep_interval,
        )
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("failed to listen for ctrl-c: {e}");
            }
            tracing::info!("shutting down");
        })
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown();
    }
    Ok(())
}
