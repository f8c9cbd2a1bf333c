//! Main entry point for the Warden backend.
//!
//! Loads configuration, opens the database, seeds the baseline roles and
//! accounts, then serves the router until the process is stopped.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use warden_backend::api::build_router;
use warden_backend::config::Config;
use warden_backend::database;
use warden_backend::services::seed;
use warden_backend::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "User and role administration backend")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.host` and `server.port`.
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let default_level = if config.server.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
    config.warn_on_weak_settings();

    let pool = database::connect(&config.database)
        .await
        .context("failed to connect to the database")?;
    database::create_all(&pool)
        .await
        .context("failed to create the schema")?;

    let listen = cli.listen.unwrap_or_else(|| config.server.listen_addr());
    let state = AppState::new(config, pool.clone())?;
    let report = seed::run(&pool, &state.auth, &state.config.seed)
        .await
        .context("seeding failed")?;
    tracing::debug!(?report, "seed report");

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    tracing::info!(addr = %listen, "listening");

    let app = build_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
