use anyhow::Context;
use clap::Parser;
use digcoll_retriever::config::Config;
use digcoll_retriever::server::{AppState, create_router};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Retrieval service for digital collections assets.
#[derive(Parser, Debug)]
#[command(name = "digcoll-retriever")]
#[command(version, about)]
struct Args {
    /// Path to a TOML configuration file. Environment variables
    /// (DIGCOLL_RETRIEVER_*) override values from the file.
    #[arg(
        short,
        long,
        env = "DIGCOLL_RETRIEVER_CONFIG",
        default_value = "config.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config).context("failed to load configuration")?;

    // RUST_LOG wins; the config's verbosity is the fallback, warn the default.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(config.verbosity.as_deref().unwrap_or("warn"))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("digcoll-retriever v{}", env!("CARGO_PKG_VERSION"));
    if config.cache.enabled {
        tracing::info!(ttl_seconds = config.cache.ttl_seconds, "result cache enabled");
    }

    let bind = config.bind.clone();
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind to {bind}"))?;
    tracing::info!("listening on {bind}");

    axum::serve(listener, app).await?;

    Ok(())
}
