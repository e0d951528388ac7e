use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use drinks_api::auth::TokenVerifier;
use drinks_api::config::{AppConfig, StorageBackend};
use drinks_api::database::{open_store, reset_store};
use drinks_api::{router, AppState};

#[derive(Parser)]
#[command(name = "drinks-api")]
#[command(about = "Coffee shop drinks menu API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, short, help = "Port to listen on, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Drop and recreate the drink table with the seed drink")]
    InitDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH0_DOMAIN, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    info!("Starting drinks API in {:?} mode", config.environment);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(config, port).await,
        Commands::InitDb => init_db(config).await,
    }
}

async fn serve(config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    let settings = config
        .auth
        .resolve()
        .context("identity provider settings are incomplete")?;
    let verifier = TokenVerifier::from_settings(settings)?;
    info!(
        "Verifying tokens from {} for audience '{}'",
        verifier.settings().issuer,
        verifier.settings().audience
    );

    let store = open_store(&config.storage)
        .await
        .context("failed to open drink store")?;
    if config.storage.backend == StorageBackend::Memory {
        store.reset().await?;
    }

    let app = router(AppState::new(store, verifier), &config.security);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.server.port));
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Drinks API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn init_db(config: AppConfig) -> anyhow::Result<()> {
    reset_store(&config.storage)
        .await
        .context("failed to reset drink store")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
