//! `serve` command handler.

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::args::ServeArgs;
use crate::config::{ConfigLoader, EngineConfig, Validator};
use crate::error::{ConfigError, GridClashError};
use crate::observability::init_metrics;
use crate::server::GameServer;

/// Start the game server and run until `cancel` fires.
///
/// # Errors
///
/// Returns a config error if the configuration is invalid, or a transport
/// error if the listener cannot be bound.
pub async fn run(args: &ServeArgs, cancel: CancellationToken) -> Result<(), GridClashError> {
    let config = resolve_config(args)?;

    if let Some(port) = config.server.metrics_port {
        init_metrics(Some(port))?;
        info!(port, "Prometheus metrics endpoint started");
    }

    let server = GameServer::start(&config, cancel).await?;
    server.run().await;
    Ok(())
}

/// Builds the effective configuration: defaults, then the file given by
/// `--config`, then command-line flags.
///
/// # Errors
///
/// Returns a config error if loading fails or the result does not validate.
pub fn resolve_config(args: &ServeArgs) -> Result<EngineConfig, GridClashError> {
    let mut config = match args.config.as_deref() {
        Some(path) => load_file(path)?,
        None => EngineConfig::default(),
    };

    if apply_overrides(&mut config, args) {
        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: "<cli>".to_string(),
                errors: result.errors,
            }
            .into());
        }
        for issue in &result.warnings {
            warn!(location = %issue.path, "{}", issue.message);
        }
    }

    Ok(config)
}

fn load_file(path: &Path) -> Result<EngineConfig, GridClashError> {
    info!(config = %path.display(), "loading configuration");
    let load_result = ConfigLoader::new().load(path)?;

    for warning in &load_result.warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    Ok(load_result.config)
}

/// Applies flag overrides; returns whether any flag was given.
fn apply_overrides(config: &mut EngineConfig, args: &ServeArgs) -> bool {
    let mut changed = false;
    if let Some(bind) = &args.bind {
        config.server.bind.clone_from(bind);
        changed = true;
    }
    if let Some(size) = args.board_size {
        config.board.size = size;
        changed = true;
    }
    if let Some(period) = args.tick_interval {
        config.timing.tick_interval = period;
        changed = true;
    }
    if let Some(unit) = args.time_per_cell {
        config.timing.time_per_cell = unit;
        changed = true;
    }
    if let Some(port) = args.metrics_port {
        config.server.metrics_port = Some(port);
        changed = true;
    }
    changed
}
