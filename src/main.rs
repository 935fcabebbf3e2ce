//! recipe_hub server
//!
//! Usage:
//!   cargo run --bin recipe_hub -- --recipes resource/recipes.csv --reviews resource/reviews.csv
//!   # then browse to http://localhost:5000/login (seed account user/password)
//!
//! Settings come from the environment (or a `.env` file), see `Config`.

use std::process::ExitCode;

use clap::Parser;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use recipe_hub::auth::{CredentialStore, SessionStore};
use recipe_hub::config::{Cli, Config};
use recipe_hub::rest::{create_router, AppState};
use recipe_hub::logging;
use recipe_hub::storage::Dataset;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load(cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let _log_guard = logging::init(config.log_format);
    config.log_summary();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Blocking load; nothing is served until both tables are in memory.
    let dataset = Dataset::load(&config.recipes_path, &config.reviews_path)?;

    let credentials =
        CredentialStore::with_seed(&config.seed_username, &config.seed_password, config.bcrypt_cost)?;
    let sessions = SessionStore::new(config.session_secret.as_bytes(), config.session_ttl);

    let app = create_router(AppState::new(dataset, credentials, sessions));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("recipe_hub listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
