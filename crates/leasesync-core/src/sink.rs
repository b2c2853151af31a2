// ── Notification sink & persistence bridge ──
//
// The reconciler's decisions leave the engine through `LeaseSink`.
// `TableBridge` is the production sink: it turns each decision into a
// conditional upsert or delete against the lease table.

use tracing::{error, info, trace};

use crate::config::MatchPolicy;
use crate::error::CoreError;
use crate::model::{LeaseRecord, NotifyKind};
use crate::table::{
    Condition, LEASE_TIME_DELETE, LEASE_TIME_FRESH, LeaseRow, LeaseTable, RowFilter, UpsertResult,
};

/// Receiver of deduplicated per-device lease notifications.
pub trait LeaseSink {
    fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError>;
}

impl<S: LeaseSink + ?Sized> LeaseSink for &mut S {
    fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError> {
        (**self).notify(kind, lease)
    }
}

impl<S: LeaseSink + ?Sized> LeaseSink for Box<S> {
    fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError> {
        (**self).notify(kind, lease)
    }
}

/// Build the table row for a notification.
///
/// Released rows carry the delete marker. An acquisition whose remaining
/// time is 0 is written as [`LEASE_TIME_FRESH`] so the store never reads
/// it as a deletion.
pub fn lease_row(kind: NotifyKind, lease: &LeaseRecord) -> LeaseRow {
    let lease_time = match kind {
        NotifyKind::Released => LEASE_TIME_DELETE,
        NotifyKind::Acquired if lease.lease_time == 0 => LEASE_TIME_FRESH,
        NotifyKind::Acquired => i64::from(lease.lease_time),
    };

    LeaseRow {
        hwaddr: lease.hwaddr.to_key(),
        inet_addr: lease.ipaddr.to_string(),
        hostname: lease.hostname.clone(),
        fingerprint: lease.fingerprint.clone(),
        vendor_class: lease.vendor_class.clone(),
        lease_time,
    }
}

/// Persistence bridge writing notifications into a [`LeaseTable`].
#[derive(Debug)]
pub struct TableBridge<T> {
    table: T,
    policy: MatchPolicy,
}

impl<T: LeaseTable> TableBridge<T> {
    pub fn new(table: T, policy: MatchPolicy) -> Self {
        Self { table, policy }
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut T {
        &mut self.table
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Row selection for `lease` under the configured policy.
    pub fn filter_for(&self, lease: &LeaseRecord) -> RowFilter {
        let filter = RowFilter::new().and(Condition::hwaddr(&lease.hwaddr));
        match self.policy {
            MatchPolicy::Hwaddr => filter,
            MatchPolicy::HwaddrInet => filter.and(Condition::inet_addr(lease.ipaddr.to_string())),
        }
    }

    fn delete(&mut self, filter: &RowFilter, row: &LeaseRow) -> Result<(), CoreError> {
        match self.table.delete_where(filter) {
            Ok(removed) => {
                info!(
                    hwaddr = %row.hwaddr,
                    inet_addr = %row.inet_addr,
                    hostname = %row.hostname,
                    removed,
                    "removed DHCP lease"
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    hwaddr = %row.hwaddr,
                    inet_addr = %row.inet_addr,
                    error = %e,
                    "failed to remove DHCP lease entry"
                );
                Err(e)
            }
        }
    }

    fn upsert(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<(), CoreError> {
        let hwaddr = row.hwaddr.clone();
        let inet_addr = row.inet_addr.clone();
        let hostname = row.hostname.clone();
        let lease_time = row.lease_time;

        match self.table.upsert_where(filter, row) {
            Ok(result) => {
                info!(
                    %hwaddr,
                    %inet_addr,
                    %hostname,
                    lease_time,
                    inserted = matches!(result, UpsertResult::Inserted),
                    "updated DHCP lease"
                );
                Ok(())
            }
            Err(e) => {
                error!(%hwaddr, error = %e, "failed to insert DHCP lease entry");
                Err(e)
            }
        }
    }
}

impl<T: LeaseTable> LeaseSink for TableBridge<T> {
    fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError> {
        let unspecified = lease.ipaddr.is_unspecified();
        info!(
            %kind,
            hwaddr = %lease.hwaddr,
            ipaddr = %lease.ipaddr,
            hostname = %lease.hostname,
            lease_time = lease.lease_time,
            skipping = unspecified,
            "DHCP lease"
        );
        if unspecified {
            return Ok(());
        }

        let row = lease_row(kind, lease);
        let filter = self.filter_for(lease);
        trace!(%filter, "updating DHCP lease table");

        match kind {
            NotifyKind::Released => self.delete(&filter, &row),
            NotifyKind::Acquired => self.upsert(&filter, row),
        }
    }
}
