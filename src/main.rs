use std::time::Duration;

mod aggregate;
mod config;
mod db;
mod error;
mod feed;
mod models;
mod nlp;
mod pipeline;
mod scheduler;

use config::Config;
use db::Repository;
use error::{AppError, Result};
use feed::FeedClient;
use scheduler::Scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Missing credentials or an unreachable database are fatal: exit
    // instead of limping along in a degraded mode.
    let config = Config::load()?;

    let repo = Repository::open(&config.db_path)
        .await
        .map_err(|e| AppError::Connectivity(format!("{}: {}", config.db_path, e)))?;
    tracing::info!("database ready at {}", config.db_path);

    let client = FeedClient::new(&config)?;
    let scheduler = Scheduler::new(
        client,
        repo,
        Duration::from_secs(config.poll_interval_minutes * 60),
    );

    // `--trigger`: one synchronous ingestion + aggregation pass, then exit.
    let trigger_once = std::env::args().any(|arg| arg == "--trigger");
    if trigger_once {
        scheduler.trigger_now().await?;
        scheduler.into_repo().close().await?;
        println!("ingestion and aggregation complete");
        return Ok(());
    }

    tracing::info!(
        "running ingestion now, then every {} minutes",
        config.poll_interval_minutes
    );
    scheduler.run_forever().await;
    Ok(())
}
