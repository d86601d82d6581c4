//! Tracing subscriber setup for the command-line binary

use crate::error::{Error, Result};
use std::path::Path;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log files kept in the logs directory
const MAX_LOG_FILES: usize = 7;

/// Initialize logging to stderr and, when `logs_dir` is given, to daily log files
///
/// `RUST_LOG` takes precedence. Without it only warnings are shown, plus debug output
/// from this crate when `verbose` is set.
///
/// The file layer:
/// - does not use ansi colors
/// - includes line numbers
/// - writes `xkcd-mirror.<date>.log` files into `logs_dir`
///
/// The returned guard flushes the file writer on drop and must be kept alive for
/// as long as the process logs.
pub fn init_logging(
    verbose: bool,
    logs_dir: Option<&Path>,
) -> Result<Option<non_blocking::WorkerGuard>> {
    let terminal_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(verbose));

    let (file_layer, guard) = match logs_dir {
        Some(logs_dir) => {
            let file_appender = rolling::Builder::new()
                .rotation(rolling::Rotation::DAILY)
                .max_log_files(MAX_LOG_FILES)
                .filename_prefix("xkcd-mirror")
                .filename_suffix("log")
                .build(logs_dir)
                .map_err(|e| {
                    Error::Other(format!(
                        "Failed to create log file in {}: {}",
                        logs_dir.display(),
                        e
                    ))
                })?;
            let (file_logger, guard) = non_blocking(file_appender);

            let layer = fmt::Layer::new()
                .with_ansi(false)
                .with_line_number(true)
                .with_writer(file_logger)
                .with_filter(env_filter(verbose));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(terminal_layer)
        .try_init()
        .map_err(|e| Error::Other(format!("Failed to initialize logging: {}", e)))?;

    Ok(guard)
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)))
}

fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "warn,xkcd_mirror=debug"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_crate_debug() {
        assert_eq!(default_directives(false), "warn");
        assert!(default_directives(true).contains("xkcd_mirror=debug"));
    }
}
