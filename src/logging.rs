//! Logging setup.
//!
//! `RUST_LOG` always wins. Otherwise the level comes from `-q` / `-v`
//! counts, falling back to the configured `log-level` (default `warn`).
//! Output goes to stderr, or as JSON lines to `log-file` when one is
//! configured.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Mutex, Once};

use tracing_subscriber::EnvFilter;

use crate::error::{BoardError, Result};

static TEST_LOGGING: Once = Once::new();

/// Resolve the filter directive for the given flags.
#[must_use]
pub fn level_directive(verbose: u8, quiet: bool, log_level: Option<&str>) -> String {
    if quiet {
        return "error".to_string();
    }
    match verbose {
        0 => log_level.unwrap_or("warn").to_string(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid, the log file cannot
/// be opened, or a subscriber is already installed.
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = level_directive(verbose, quiet, log_level);
            EnvFilter::try_new(&directive)
                .map_err(|e| BoardError::Config(format!("invalid log level '{directive}': {e}")))?
        }
    };

    let installed = if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| crate::error::io_context("open log file", path, e))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr)
            .try_init()
    };

    installed.map_err(|e| BoardError::Other(anyhow::anyhow!("failed to install logger: {e}")))
}

/// Install a test-writer subscriber once per test binary.
pub fn init_test_logging() {
    TEST_LOGGING.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_wins() {
        assert_eq!(level_directive(3, true, Some("debug")), "error");
    }

    #[test]
    fn verbosity_steps() {
        assert_eq!(level_directive(0, false, None), "warn");
        assert_eq!(level_directive(0, false, Some("info")), "info");
        assert_eq!(level_directive(1, false, None), "info");
        assert_eq!(level_directive(2, false, None), "debug");
        assert_eq!(level_directive(5, false, None), "trace");
    }

    #[test]
    fn test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::info!("test logging ready");
    }
}
