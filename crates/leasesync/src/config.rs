//! CLI configuration: thin wrapper around `leasesync_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --store, --no-coalesce, --match-policy).

use std::path::PathBuf;

use leasesync_core::{EngineConfig, MatchPolicy};

use crate::cli::{GlobalOpts, MatchPolicyArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use leasesync_config::{Config, config_path, load_config_from, save_config_to};

impl From<MatchPolicyArg> for MatchPolicy {
    fn from(arg: MatchPolicyArg) -> Self {
        match arg {
            MatchPolicyArg::Hwaddr => Self::Hwaddr,
            MatchPolicyArg::HwaddrInet => Self::HwaddrInet,
        }
    }
}

// ── Resolved settings ───────────────────────────────────────────────

/// Everything a command needs after config, env and flags are merged.
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: Config,
    pub config_path: PathBuf,
    pub engine: EngineConfig,
    pub store_path: PathBuf,
}

/// Config file in effect: `--config` / `LEASESYNC_CONFIG`, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file and apply CLI flag overrides.
///
/// Flag overrides take priority over env, which beats the file.
pub fn resolve(global: &GlobalOpts) -> Result<Settings, CliError> {
    let path = active_config_path(global);
    let config = load_config_from(&path)?;
    leasesync_config::validate_log(&config)?;

    // 1. Engine (flags > env > file), checked after overrides so
    //    `--no-coalesce` can unlock a file's `hwaddr-inet`
    let file_policy = leasesync_config::parse_match_policy(&config.engine.match_policy)?;
    let engine = EngineConfig {
        coalesce: config.engine.coalesce && !global.no_coalesce,
        match_policy: global.match_policy.map_or(file_policy, Into::into),
    };
    leasesync_config::validate_engine(&engine)?;

    // 2. Lease table location
    let store_path = global
        .store
        .clone()
        .unwrap_or_else(|| leasesync_config::store_path(&config));

    tracing::debug!(
        config = %path.display(),
        store = %store_path.display(),
        coalesce = engine.coalesce,
        match_policy = %engine.match_policy,
        "resolved settings"
    );

    Ok(Settings {
        config,
        config_path: path,
        engine,
        store_path,
    })
}
