//! Service binary for the Furrow simulation.
//!
//! Wires configuration, structured logging, the crop catalog, the run
//! store and the HTTP server together, then serves until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `FURROW_CONFIG` (default `furrow-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Load the catalog (built-in or YAML manifest)
//! 4. Create the run store and orchestrator
//! 5. Create the bootstrap run, if configured
//! 6. Start the HTTP + `WebSocket` server
//! 7. Serve until Ctrl-C or the server stops

mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use furrow_core::config::{CatalogConfig, LoggingConfig, SimulationConfig};
use furrow_core::{InMemoryRunStore, Orchestrator, RunDefaults};
use furrow_observer::ServerConfig;
use furrow_observer::state::AppState;
use furrow_world::Catalog;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file read when `FURROW_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "furrow-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the server
/// stops with an error.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let config_path = std::env::var("FURROW_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("furrow-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        grid_size = config.world.grid_size,
        baseline_year = config.world.baseline_year,
        "World defaults"
    );

    // 3. Load the catalog.
    let catalog = load_catalog(&config.catalog)?;
    info!(
        crops = catalog.crops.len(),
        regions = catalog.regions.len(),
        infrastructure = catalog.infrastructure.len(),
        "Catalog loaded"
    );

    // 4. Create the run store and orchestrator.
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(catalog),
        Arc::new(InMemoryRunStore::new()),
        RunDefaults::from(&config.world),
        config.finance.premium_rate,
    ));

    // 5. Bootstrap run.
    if let Some(region) = &config.world.bootstrap_region {
        let overview = orchestrator.new_run(region, None)?;
        info!(run_id = %overview.run_id, region = %region, "Bootstrap run created");
    }

    // 6. Start the server.
    let server_config = ServerConfig {
        host: config.observer.host.clone(),
        port: config.observer.port,
    };
    let app_state = Arc::new(AppState::new(orchestrator));
    let (handle, addr) = furrow_observer::spawn_server(&server_config, app_state)?;
    info!(%addr, "Server started");

    // 7. Serve until interrupted.
    tokio::select! {
        result = handle => {
            result.map_err(|e| EngineError::Task { message: e.to_string() })??;
            warn!("Server task exited");
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutdown requested");
        }
    }

    info!("furrow-engine stopped");
    Ok(())
}

/// Load configuration from `path`, or defaults when the file is absent.
///
/// The flag is `true` when the file was read.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::parse("")?, false))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Built-in catalog, or the manifest named in the config.
fn load_catalog(config: &CatalogConfig) -> Result<Catalog, EngineError> {
    match &config.path {
        Some(path) => Ok(Catalog::from_file(path)?),
        None => Ok(furrow_world::builtin_catalog()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let (config, from_file) =
            load_config(Path::new("/nonexistent/furrow-config.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config.world.baseline_year, 2014);
        assert_eq!(config.world.bootstrap_region, None);
    }

    #[test]
    fn shipped_config_parses() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../furrow-config.yaml");
        let (config, from_file) = load_config(&path).unwrap();
        assert!(from_file);
        assert_eq!(config.world.grid_size, 32);
        assert_eq!(config.world.seed, 1337);
    }

    #[test]
    fn default_catalog_is_builtin() {
        let catalog = load_catalog(&CatalogConfig::default()).unwrap();
        assert!(catalog.crops.contains_key("fallow"));
        assert_eq!(catalog.regions.len(), 3);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let config = CatalogConfig {
            path: Some(PathBuf::from("/nonexistent/catalog.yaml")),
        };
        assert!(matches!(
            load_catalog(&config),
            Err(EngineError::World { .. })
        ));
    }

    #[test]
    fn shipped_manifest_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../manifests/catalog.yaml");
        let config = CatalogConfig { path: Some(path) };
        let catalog = load_catalog(&config).unwrap();
        assert_eq!(catalog.crops.len(), furrow_world::builtin_catalog().crops.len());
    }

    #[tokio::test]
    async fn occupied_port_is_a_server_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = ServerConfig {
            host: String::from("127.0.0.1"),
            port: taken.local_addr().unwrap().port(),
        };
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(furrow_world::builtin_catalog()),
            Arc::new(InMemoryRunStore::new()),
            RunDefaults::default(),
            0.02,
        ));
        let state = Arc::new(AppState::new(orchestrator));
        let result = furrow_observer::spawn_server(&config, state).map_err(EngineError::from);
        assert!(matches!(result, Err(EngineError::Server { .. })));
    }
}
