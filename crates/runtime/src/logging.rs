//! Subscriber setup for binaries.
//!
//! Libraries only emit events; the binary calls [`init`] once at startup.
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::api::{Result, RuntimeError};

/// Log file written under the optional log directory.
pub const LOG_FILE: &str = "kingdom.log";

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG`, with `info` added as the default level.
/// Events go to stderr and, when `log_dir` is given, to `kingdom.log` inside
/// it through a non-blocking writer.
///
/// # Returns
///
/// The file writer's guard. Keep it alive until shutdown or buffered lines
/// are lost.
pub fn init(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    let Some(dir) = log_dir else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .try_init()?;
        return Ok(None);
    };

    std::fs::create_dir_all(dir).map_err(|source| RuntimeError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(target: "kingdom::tick", "log file: {}", dir.join(LOG_FILE).display());
    Ok(Some(guard))
}
