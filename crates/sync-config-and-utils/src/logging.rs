//! Logging initialization for ledger-sync binaries.

use crate::Config;
use observability::{LogConfig, LogFormat};

/// Service name written into every structured log line.
pub const SERVICE_NAME: &str = "ledger-sync";

/// Install the global subscriber described by `config`.
///
/// When logs go to a file, compact lines are mirrored on stderr so an
/// operator running the CLI still sees progress.
pub fn init_logging(config: &Config) {
    observability::init_with_config(log_config(config));
}

fn log_config(config: &Config) -> LogConfig {
    LogConfig {
        service_name: SERVICE_NAME.to_string(),
        default_level: config.log_level.clone(),
        log_path: config.log_path.clone(),
        also_stderr: config.log_path.is_some(),
        format: LogFormat::parse(&config.log_format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn file_logging_mirrors_to_stderr() {
        let mut config = Config::default();
        config.log_path = Some(PathBuf::from("/tmp/ledger-sync.jsonl"));
        config.log_level = "debug".into();

        let log = log_config(&config);
        assert_eq!(log.service_name, "ledger-sync");
        assert_eq!(log.default_level, "debug");
        assert!(log.also_stderr);
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn pretty_format_is_honoured() {
        let mut config = Config::default();
        config.log_format = "pretty".into();

        let log = log_config(&config);
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(!log.also_stderr);
    }
}
