// ── Runtime engine configuration ──
//
// These types describe how leases are reconciled and matched against the
// lease table. They never touch disk; `leasesync-config` builds them from
// the TOML file and hands them in.

use serde::{Deserialize, Serialize};

/// Which columns select the row an upsert or delete applies to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MatchPolicy {
    /// One row per device: `hwaddr == x`.
    #[default]
    Hwaddr,
    /// One row per (device, address): `hwaddr == x && inet_addr == y`.
    /// Only consistent with `coalesce = false`; a coalesced row keeps the
    /// address it was announced with.
    HwaddrInet,
}

/// Configuration for a single [`LeaseEngine`](crate::LeaseEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Collapse leases to one survivor per device before notifying.
    /// When off, every raw event is forwarded to the sink as-is.
    pub coalesce: bool,
    /// Row selection used by the persistence bridge.
    pub match_policy: MatchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce: true,
            match_policy: MatchPolicy::Hwaddr,
        }
    }
}

impl EngineConfig {
    /// Passthrough configuration: no coalescing, rows matched per address.
    pub fn passthrough() -> Self {
        Self {
            coalesce: false,
            match_policy: MatchPolicy::HwaddrInet,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn match_policy_round_trips_through_text() {
        assert_eq!(MatchPolicy::HwaddrInet.to_string(), "hwaddr-inet");
        assert_eq!("hwaddr".parse::<MatchPolicy>().unwrap(), MatchPolicy::Hwaddr);
    }

    #[test]
    fn default_coalesces_per_device() {
        let cfg = EngineConfig::default();
        assert!(cfg.coalesce);
        assert_eq!(cfg.match_policy, MatchPolicy::Hwaddr);
    }
}
