// ── Lease domain types ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use super::hwaddr::MacAddress;
use crate::error::CoreError;

/// A single DHCP lease as reported by the lease event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub hwaddr: MacAddress,
    pub ipaddr: IpAddr,
    /// Remaining lease duration in seconds. 0 is the store's delete marker.
    #[serde(default)]
    pub lease_time: u32,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub vendor_class: String,
    #[serde(default)]
    pub fingerprint: String,
}

impl LeaseRecord {
    pub fn new(hwaddr: MacAddress, ipaddr: IpAddr, lease_time: u32) -> Self {
        Self {
            hwaddr,
            ipaddr,
            lease_time,
            hostname: String::new(),
            vendor_class: String::new(),
            fingerprint: String::new(),
        }
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    #[must_use]
    pub fn with_vendor_class(mut self, vendor_class: impl Into<String>) -> Self {
        self.vendor_class = vendor_class.into();
        self
    }

    #[must_use]
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn key(&self) -> LeaseKey {
        LeaseKey {
            hwaddr: self.hwaddr,
            ipaddr: self.ipaddr,
        }
    }
}

/// Composite key of the primary lease index.
///
/// Field order defines the ordering: hardware address first, then IP
/// address, so all entries of one device are adjacent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LeaseKey {
    pub hwaddr: MacAddress,
    pub ipaddr: IpAddr,
}

impl fmt::Display for LeaseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hwaddr, self.ipaddr)
    }
}

/// Raw notification from the lease event source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseEvent {
    #[serde(default)]
    pub released: bool,
    pub record: LeaseRecord,
}

impl LeaseEvent {
    pub fn acquired(record: LeaseRecord) -> Self {
        Self {
            released: false,
            record,
        }
    }

    pub fn released(record: LeaseRecord) -> Self {
        Self {
            released: true,
            record,
        }
    }

    /// Parse one line of a JSON-lines event feed. Blank lines and lines
    /// starting with `#` yield `None`. `line_no` is 1-based, for errors.
    pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Self>, CoreError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        serde_json::from_str(trimmed)
            .map(Some)
            .map_err(|e| CoreError::InvalidEvent {
                line: line_no,
                reason: e.to_string(),
            })
    }
}

/// What the reconciler decided for a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotifyKind {
    Acquired,
    Released,
}

/// A deduplicated, per-device notification handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseNotification {
    pub kind: NotifyKind,
    pub record: LeaseRecord,
}

impl LeaseNotification {
    pub fn acquired(record: LeaseRecord) -> Self {
        Self {
            kind: NotifyKind::Acquired,
            record,
        }
    }

    pub fn released(record: LeaseRecord) -> Self {
        Self {
            kind: NotifyKind::Released,
            record,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn key_orders_by_hwaddr_before_ip() {
        let a = LeaseRecord::new(
            "00:00:00:00:00:01".parse().unwrap(),
            "10.0.0.9".parse().unwrap(),
            60,
        );
        let b = LeaseRecord::new(
            "00:00:00:00:00:02".parse().unwrap(),
            "10.0.0.1".parse().unwrap(),
            60,
        );
        assert!(a.key() < b.key());
    }

    #[test]
    fn event_deserializes_with_defaults() {
        let event: LeaseEvent = serde_json::from_str(
            r#"{"record": {"hwaddr": "AA:BB:CC:DD:EE:FF", "ipaddr": "10.0.0.5"}}"#,
        )
        .unwrap();
        assert!(!event.released);
        assert_eq!(event.record.lease_time, 0);
        assert_eq!(event.record.hwaddr.to_string(), "aa:bb:cc:dd:ee:ff");
        assert!(event.record.hostname.is_empty());
    }

    #[test]
    fn parse_line_skips_blanks_and_comments() {
        assert!(LeaseEvent::parse_line("   ", 1).unwrap().is_none());
        assert!(LeaseEvent::parse_line("# seeded leases", 2).unwrap().is_none());
    }

    #[test]
    fn parse_line_reports_line_number() {
        let err = LeaseEvent::parse_line("{\"released\": true}", 7).unwrap_err();
        assert!(matches!(err, CoreError::InvalidEvent { line: 7, .. }));

        let err = LeaseEvent::parse_line(
            r#"{"record": {"hwaddr": "not-a-mac", "ipaddr": "10.0.0.1"}}"#,
            3,
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn notify_kind_is_lowercase() {
        assert_eq!(NotifyKind::Acquired.to_string(), "acquired");
        assert_eq!("released".parse::<NotifyKind>().unwrap(), NotifyKind::Released);
    }
}
