//! Logging configuration for pandocomatic
//!
//! Diagnostics go to stderr so command output on stdout stays clean. A log
//! file, when given, receives everything at debug level.

use pandocomatic_core::Result;
use std::path::Path;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system
///
/// # Arguments
/// * `verbose` - Enable debug level logging
/// * `log_file` - Optional path to append logs to
///
/// `RUST_LOG` overrides the level chosen by `verbose`.
///
/// # Examples
/// ```ignore
/// init(false, None)?;
/// init(true, Some(Path::new("pandocomatic.log")))?;
/// ```
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pandocomatic={level},pandocomatic_cli={level},pandocomatic_config={level},pandocomatic_core={level}"
        ))
    });

    // Timestamps only help when chasing down a verbose run
    let stderr_layer = if verbose {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_ansi(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .without_time()
            .compact()
            .with_ansi(true)
            .with_filter(env_filter)
            .boxed()
    };

    let file_layer = match log_file {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)?;

            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .pretty()
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
