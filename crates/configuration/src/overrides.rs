use crate::settings::Settings;
use clap::Args;

/// Command-line flags that take precedence over the file and environment.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsOverrides {
    /// Webhook URL that receives the snapshots.
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Coalescing delay in milliseconds.
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request timeout in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl Settings {
    /// Applies any flags that were given. Call `validate` afterwards.
    pub fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(url) = &overrides.endpoint_url {
            self.transport.endpoint_url = url.clone();
        }
        if let Some(delay_ms) = overrides.delay_ms {
            self.throttle.delay_ms = delay_ms;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.transport.request_timeout_ms = timeout_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use clap::Parser;
    use serial_test::serial;
    use std::io::Write;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        overrides: SettingsOverrides,
    }

    #[test]
    fn only_given_flags_replace_values() {
        let cli = Cli::parse_from(["tradecast", "--delay-ms", "75"]);
        let mut settings = Settings::default();

        settings.apply_overrides(&cli.overrides);

        assert_eq!(settings.throttle.delay_ms, 75);
        assert_eq!(settings.transport, Settings::default().transport);
    }

    #[test]
    fn overridden_values_are_still_validated() {
        let cli = Cli::parse_from(["tradecast", "--endpoint-url", "mailto:ops@example.com"]);
        let mut settings = Settings::default();

        settings.apply_overrides(&cli.overrides);

        assert!(settings.validate().is_err());
    }

    #[test]
    #[serial]
    fn a_flag_can_correct_an_invalid_file_value() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[transport]\nendpoint_url = \"ws://localhost/feed\"").unwrap();

        let invalid = crate::load_config(Some(file.path()));
        assert!(matches!(invalid, Err(ConfigError::ValidationError(_))));

        let cli = Cli::parse_from(["tradecast", "--endpoint-url", "http://127.0.0.1:9000/webhook"]);
        let settings = crate::load_config_with_overrides(Some(file.path()), &cli.overrides).unwrap();
        assert_eq!(settings.transport.endpoint_url, "http://127.0.0.1:9000/webhook");

        let untouched = Cli::parse_from(["tradecast"]);
        let still_invalid = crate::load_config_with_overrides(Some(file.path()), &untouched.overrides);
        assert!(matches!(still_invalid, Err(ConfigError::ValidationError(_))));
    }
}
