use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
#[cfg(feature = "clap")]
pub mod overrides;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use overrides::SettingsOverrides;
pub use settings::{LoggingSettings, Settings, ThrottleSettings, TransportSettings};

/// The file read when no explicit path is given. It may be absent.
pub const DEFAULT_CONFIG_FILE: &str = "tradecast.toml";

/// Prefix of environment variables that override file values,
/// e.g. `TRADECAST_TRANSPORT__ENDPOINT_URL` or `TRADECAST_THROTTLE__DELAY_MS`.
pub const ENV_PREFIX: &str = "TRADECAST";

/// Loads the broadcaster configuration.
///
/// Values come from the built-in defaults, then the TOML file (`path`, or
/// `tradecast.toml` in the working directory if present), then `TRADECAST_*`
/// environment variables. An explicitly named file must exist.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = load_layers(path)?;
    settings.validate()?;
    Ok(settings)
}

/// Like [`load_config`], with command-line overrides applied on top before
/// anything is validated, so a flag can correct a bad file value.
#[cfg(feature = "clap")]
pub fn load_config_with_overrides(
    path: Option<&Path>,
    overrides: &SettingsOverrides,
) -> Result<Settings, ConfigError> {
    let mut settings = load_layers(path)?;
    settings.apply_overrides(overrides);
    settings.validate()?;
    Ok(settings)
}

fn load_layers(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(builder.try_deserialize::<Settings>()?)
}

/// Parses settings from TOML text, without consulting files or the environment.
pub fn load_config_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
