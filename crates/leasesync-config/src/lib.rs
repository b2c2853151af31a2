//! Configuration for the leasesync agent.
//!
//! TOML file, `LEASESYNC_*` environment overrides, and translation to
//! `leasesync_core::EngineConfig`. The CLI layers its flag overrides on
//! top of what this crate resolves.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use leasesync_core::{EngineConfig, MatchPolicy};

/// Environment variable prefix; nested keys use `__` (`LEASESYNC_ENGINE__COALESCE`).
pub const ENV_PREFIX: &str = "LEASESYNC_";

/// `LEASESYNC_CONFIG` and `LEASESYNC_STORE` are CLI flag variables, not config keys.
const ENV_FLAG_KEYS: &[&str] = &["config", "store"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineSection {
    /// Collapse leases to one row per device.
    #[serde(default = "default_coalesce")]
    pub coalesce: bool,

    /// Row selection: "hwaddr" or "hwaddr-inet".
    #[serde(default = "default_match_policy")]
    pub match_policy: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            coalesce: default_coalesce(),
            match_policy: default_match_policy(),
        }
    }
}

fn default_coalesce() -> bool {
    true
}
fn default_match_policy() -> String {
    MatchPolicy::default().to_string()
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSection {
    /// Lease table file. Defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LogSection {
    /// Default filter directive when neither `RUST_LOG` nor `-v` is given.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json".
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "warn".into()
}
fn default_log_format() -> String {
    "text".into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "leasesync", "leasesync")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default lease table location.
pub fn default_store_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".local/share").join("leases.json"),
        |dirs| dirs.data_dir().join("leases.json"),
    )
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("leasesync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(ENV_FLAG_KEYS).split("__"))
}

/// Load the full Config from `path` + environment. A missing file yields
/// the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Parse a match policy name.
pub fn parse_match_policy(raw: &str) -> Result<MatchPolicy, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "engine.match_policy".into(),
        reason: format!("expected 'hwaddr' or 'hwaddr-inet', got '{raw}'"),
    })
}

/// Build the engine configuration from the `[engine]` section.
pub fn engine_config(cfg: &Config) -> Result<EngineConfig, ConfigError> {
    let engine = EngineConfig {
        coalesce: cfg.engine.coalesce,
        match_policy: parse_match_policy(&cfg.engine.match_policy)?,
    };
    validate_engine(&engine)?;
    Ok(engine)
}

/// Reject engine settings that cannot keep the table consistent.
///
/// A coalesced device's row stays on the address it was first announced
/// with while a longer lease takes over silently, so a per-address match
/// would miss that row on release. `hwaddr-inet` needs `coalesce = false`.
pub fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.coalesce && engine.match_policy == MatchPolicy::HwaddrInet {
        return Err(ConfigError::Validation {
            field: "engine.match_policy".into(),
            reason: "'hwaddr-inet' requires coalesce = false".into(),
        });
    }
    Ok(())
}

/// Lease table path: configured, or the platform default.
pub fn store_path(cfg: &Config) -> PathBuf {
    cfg.store.path.clone().unwrap_or_else(default_store_path)
}

/// Validate the `[log]` section.
pub fn validate_log(cfg: &Config) -> Result<(), ConfigError> {
    match cfg.log.format.as_str() {
        "text" | "json" => Ok(()),
        other => Err(ConfigError::Validation {
            field: "log.format".into(),
            reason: format!("expected 'text' or 'json', got '{other}'"),
        }),
    }
}
