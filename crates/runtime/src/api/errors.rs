//! Unified error types surfaced by the runtime API.
//!
//! Wraps configuration, I/O and decision-tier failures so the binary can
//! bubble them up with consistent context. Per-agent failures inside a tick
//! never reach this type; the tick loop isolates them.
use std::path::PathBuf;

use thiserror::Error;

use kingdom_core::{ConfigError, DecisionError, ErrorSeverity};

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid decision configuration")]
    Config(#[from] ConfigError),

    #[error("invalid runtime configuration: {0}")]
    InvalidConfig(String),

    #[error("environment variable {key} has invalid value {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML")]
    Toml(#[from] toml::de::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("decision journal write failed")]
    Journal(#[source] std::io::Error),

    #[error("failed to encode journal entry")]
    Encode(#[from] serde_json::Error),

    #[error("logging already initialized")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error(transparent)]
    Decision(#[from] DecisionError),
}

impl RuntimeError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::Config(_)
            | RuntimeError::InvalidConfig(_)
            | RuntimeError::InvalidEnv { .. }
            | RuntimeError::Toml(_)
            | RuntimeError::InvalidScenario(_) => ErrorSeverity::Validation,
            RuntimeError::Decision(error) => error.severity(),
            RuntimeError::Io { .. }
            | RuntimeError::Journal(_)
            | RuntimeError::Encode(_)
            | RuntimeError::Logging(_) => ErrorSeverity::Internal,
        }
    }
}
