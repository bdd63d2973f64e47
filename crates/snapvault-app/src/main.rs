//! Snapvault application binary - composition root.
//!
//! 1. Parse CLI flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Open the configured capture store (memory, redis, or sqlite)
//! 4. Start the axum API server

mod cli;

use clap::Parser;

use snapvault_api::state::AppState;
use snapvault_core::config::{SnapvaultConfig, StorageBackend};

use cli::{expand_home, CliArgs};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let config_exists = config_file.exists();
    let mut config = if config_exists {
        SnapvaultConfig::load(&config_file)?
    } else {
        SnapvaultConfig::default()
    };

    if let Some(level) = args.log_level.clone() {
        config.general.log_level = level;
    }
    config.server.port = args.resolve_port(config.server.port);
    config.storage.backend = args.resolve_backend(config.storage.backend);
    if config.storage.backend == StorageBackend::Sqlite {
        config.storage.sqlite_path = expand_home(&config.storage.sqlite_path)
            .to_string_lossy()
            .to_string();
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Snapvault v{}", env!("CARGO_PKG_VERSION"));
    if config_exists {
        tracing::info!(path = %config_file.display(), "Configuration loaded");
    } else {
        tracing::info!(path = %config_file.display(), "No config file, using defaults");
    }

    let store = match snapvault_storage::open_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(backend = %config.storage.backend, error = %e, "Failed to open capture store");
            return Err(e.into());
        }
    };

    let server = config.server.clone();
    let state = AppState::new(config, store);

    snapvault_api::start_server(&server, state).await?;

    Ok(())
}
