use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::model::LogConfig;

/// Environment variable overriding `[log] filter`
pub const LOG_ENV: &str = "GL_LOG";

/// Where log lines go
pub enum LogTarget<'a> {
    /// CLI commands: stderr, so stdout stays clean for `--json`
    Stderr,
    /// The TUI owns the terminal; log to `config.file` under this directory
    File(&'a Path),
}

fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &LogConfig, target: LogTarget<'_>) {
    let registry = tracing_subscriber::registry().with(filter(config));
    let result = match target {
        LogTarget::Stderr => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogTarget::File(dir) => {
            let path = dir.join(&config.file);
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => registry
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(Mutex::new(file))
                            .with_ansi(false),
                    )
                    .try_init(),
                Err(e) => {
                    eprintln!("warning: could not open log file {}: {}", path.display(), e);
                    return;
                }
            }
        }
    };
    // Already installed (tests, repeated init)
    let _ = result;
}
