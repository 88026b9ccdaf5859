//! Structured logging with tracing
//!
//! Console output is always enabled; an append-mode log file can be added
//! through [`LoggingSettings::log_file`].

use crate::config::LoggingSettings;
use crate::error::{Result, SnapshotError};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Install the global subscriber
///
/// `RUST_LOG` wins over `settings.level` when set.
pub fn init_logging(settings: &LoggingSettings) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            SnapshotError::Configuration(format!("invalid log level '{}': {}", settings.level, e))
        })?;

    let console_layer = if settings.json_format {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed()
    } else {
        fmt::layer().with_target(false).compact().boxed()
    };

    let file_layer = match &settings.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(SnapshotError::io(format!("opening log file {}", path.display())))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .boxed(),
            )
        }
        None => None,
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| SnapshotError::Configuration(format!("logging already initialized: {}", e)))?;

    Ok(())
}
