use crate::error::ConfigError;
use crate::settings::LoggingSettings;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Base name of the rolling log files, e.g. `tradecast.log.2025-01-31`.
pub const LOG_FILE_PREFIX: &str = "tradecast.log";

/// Builds the filter. `RUST_LOG` wins over the configured directive when set.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, ConfigError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .map_err(|e| ConfigError::Logging(format!("invalid filter '{}': {}", settings.filter, e))),
    }
}

/// Installs the global tracing subscriber.
///
/// Events always go to stdout. With `directory` set they are additionally
/// written, without ANSI colours, to a daily rolling file. The returned guard
/// flushes that file on drop and must be held for the life of the process.
pub fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>, ConfigError> {
    let filter = env_filter(settings)?;
    let stdout = fmt::layer().with_target(true);

    let (file, guard) = match &settings.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    match &settings.directory {
        Some(directory) => tracing::info!(directory = %directory.display(), "Logging to rolling file."),
        None => tracing::debug!("Logging to stdout only."),
    }
    Ok(guard)
}
