//! Shared helpers for command handlers.

use tabled::Tabled;

use leasesync_core::{EngineStats, JsonFileTable, LeaseNotification, LeaseRow};

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct LeaseRowView {
    #[tabled(rename = "MAC")]
    hwaddr: String,
    #[tabled(rename = "IP")]
    inet_addr: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Vendor Class")]
    vendor_class: String,
    #[tabled(rename = "Lease")]
    lease_time: String,
}

impl From<&LeaseRow> for LeaseRowView {
    fn from(r: &LeaseRow) -> Self {
        Self {
            hwaddr: r.hwaddr.clone(),
            inet_addr: r.inet_addr.clone(),
            hostname: dash_if_empty(&r.hostname),
            vendor_class: dash_if_empty(&r.vendor_class),
            lease_time: format_lease_time(r.lease_time),
        }
    }
}

#[derive(Tabled)]
struct NotificationView {
    #[tabled(rename = "Event")]
    kind: String,
    #[tabled(rename = "MAC")]
    hwaddr: String,
    #[tabled(rename = "IP")]
    ipaddr: String,
    #[tabled(rename = "Lease")]
    lease_time: String,
}

impl From<&LeaseNotification> for NotificationView {
    fn from(n: &LeaseNotification) -> Self {
        Self {
            kind: n.kind.to_string(),
            hwaddr: n.record.hwaddr.to_string(),
            ipaddr: n.record.ipaddr.to_string(),
            lease_time: format!("{}s", n.record.lease_time),
        }
    }
}

fn dash_if_empty(value: &str) -> String {
    if value.is_empty() {
        "-".into()
    } else {
        value.into()
    }
}

/// Human form of the persisted `lease_time` column.
pub fn format_lease_time(lease_time: i64) -> String {
    match lease_time {
        leasesync_core::LEASE_TIME_FRESH => "fresh".into(),
        secs => format!("{secs}s"),
    }
}

// ── Rendering ───────────────────────────────────────────────────────

pub fn render_rows(format: &OutputFormat, rows: &[LeaseRow]) -> Result<String, CliError> {
    output::render_list(format, rows, |r| LeaseRowView::from(r), |r| r.hwaddr.clone())
}

pub fn render_notifications(
    format: &OutputFormat,
    notifications: &[LeaseNotification],
) -> Result<String, CliError> {
    output::render_list(format, notifications, |n| NotificationView::from(n), |n| {
        format!("{} {} {}", n.kind, n.record.hwaddr, n.record.ipaddr)
    })
}

/// One-line run summary on stderr.
pub fn print_summary(stats: &EngineStats, quiet: bool) {
    if quiet {
        return;
    }
    eprintln!(
        "{} events, {} notifications, {} persistence failures, {} unknown releases",
        stats.events, stats.notifications, stats.failures, stats.unknown_releases
    );
}

// ── Table / confirmation ────────────────────────────────────────────

/// Open the lease table named by the resolved settings.
pub fn open_table(settings: &Settings) -> Result<JsonFileTable, CliError> {
    JsonFileTable::open(&settings.store_path).map_err(|e| CliError::store(&settings.store_path, e))
}

/// Refuse a destructive action unless `--yes` was passed.
pub fn require_confirmation(action: &str, yes_flag: bool) -> Result<(), CliError> {
    if yes_flag {
        return Ok(());
    }
    Err(CliError::ConfirmationRequired {
        action: action.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_marker_is_named() {
        assert_eq!(format_lease_time(-1), "fresh");
        assert_eq!(format_lease_time(3600), "3600s");
    }

    #[test]
    fn confirmation_respects_yes_flag() {
        assert!(require_confirmation("table clear", true).is_ok());
        assert!(matches!(
            require_confirmation("table clear", false),
            Err(CliError::ConfirmationRequired { .. })
        ));
    }
}
