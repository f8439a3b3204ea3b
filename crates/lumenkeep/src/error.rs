//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable exit code.

use miette::Diagnostic;
use thiserror::Error;

use lumenkeep_config::ConfigError;
use lumenkeep_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const REGISTRY: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(lumenkeep::config),
        help(
            "Check the config file and any LUMENKEEP_* environment variables.\n\
             Show the resolved settings with: lumenkeep config show"
        )
    )]
    Config {
        #[source]
        source: ConfigError,
    },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(lumenkeep::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Accessory state error: {message}")]
    #[diagnostic(
        code(lumenkeep::registry),
        help("Check that the state file is readable JSON, or point --registry elsewhere.")
    )]
    Registry { message: String },

    // ── Network ──────────────────────────────────────────────────────
    #[error("Network error: {message}")]
    #[diagnostic(code(lumenkeep::network))]
    Network { message: String },

    #[error("{message}")]
    #[diagnostic(code(lumenkeep::timeout))]
    Timeout { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(lumenkeep::validation))]
    Validation { field: String, reason: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(lumenkeep::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render {format} output: {message}")]
    #[diagnostic(code(lumenkeep::render))]
    Render { format: &'static str, message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::ConfigExists { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::Registry { .. } => exit_code::REGISTRY,
            Self::Network { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(source: ConfigError) -> Self {
        Self::Config { source }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            e @ (CoreError::Discovery { .. } | CoreError::Transport { .. }) => Self::Network {
                message: e.to_string(),
            },
            e @ CoreError::Timeout { .. } => Self::Timeout {
                message: e.to_string(),
            },
            CoreError::InvalidDevice { field, reason } => Self::Validation { field, reason },
            CoreError::Registry { message } => Self::Registry { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            e @ (CoreError::Adapter { .. } | CoreError::Internal(_)) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}
