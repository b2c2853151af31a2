//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use leasesync_config::ConfigError;
use leasesync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const INPUT: i32 = 4;
    pub const NOT_FOUND: i32 = 5;
    pub const STORE: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Input ────────────────────────────────────────────────────────

    #[error("Invalid lease event on line {line}: {reason}")]
    #[diagnostic(
        code(leasesync::invalid_event),
        help(
            "Each line must be a JSON object such as\n\
             {{\"released\": false, \"record\": {{\"hwaddr\": \"00:11:22:33:44:55\", \"ipaddr\": \"192.168.1.10\", \"lease_time\": 3600}}}}\n\
             Use --skip-invalid to ignore malformed lines."
        )
    )]
    InvalidEvent { line: usize, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(leasesync::validation))]
    Validation { field: String, reason: String },

    // ── Store ────────────────────────────────────────────────────────

    #[error("Lease table error: {message}")]
    #[diagnostic(
        code(leasesync::store),
        help("Check that the lease table path is readable and writable: {path}")
    )]
    Store { path: String, message: String },

    #[error("No lease row for '{hwaddr}'")]
    #[diagnostic(
        code(leasesync::not_found),
        help("Run: leasesync table list to see persisted leases")
    )]
    NotFound { hwaddr: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(leasesync::config),
        help("Check the config file (leasesync config path) and LEASESYNC_* variables.")
    )]
    Config(#[from] ConfigError),

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(leasesync::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(leasesync::confirmation_required),
        help("Use --yes (-y) to confirm.")
    )]
    ConfirmationRequired { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(leasesync::json))]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    #[diagnostic(code(leasesync::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML serialization failed: {0}")]
    #[diagnostic(code(leasesync::toml))]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidEvent { .. } => exit_code::INPUT,
            Self::Validation { .. } | Self::ConfirmationRequired { .. } => exit_code::USAGE,
            Self::Store { .. } => exit_code::STORE,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Config(_) | Self::ConfigExists { .. } => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }

    /// Wrap a core error raised while touching the table at `path`.
    pub fn store(path: &std::path::Path, err: CoreError) -> Self {
        match err {
            CoreError::InvalidHardwareAddress { .. } | CoreError::InvalidEvent { .. } => {
                Self::from(err)
            }
            other => Self::Store {
                path: path.display().to_string(),
                message: other.to_string(),
            },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidHardwareAddress { input } => CliError::Validation {
                field: "hwaddr".into(),
                reason: format!("'{input}' is not a MAC address"),
            },

            CoreError::InvalidEvent { line, reason } => CliError::InvalidEvent { line, reason },

            CoreError::Store {
                operation,
                hwaddr,
                reason,
            } => CliError::Store {
                path: String::new(),
                message: format!("{operation} for {hwaddr} failed: {reason}"),
            },

            CoreError::Io(e) => CliError::Io(e),

            CoreError::Json(e) => CliError::Json(e),
        }
    }
}
