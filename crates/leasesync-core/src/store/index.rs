// ── Primary lease index ──
//
// Every concurrently active (MAC, IP) assignment, keyed uniquely on the
// pair. Ordered so that one device's entries are contiguous.

use std::collections::BTreeMap;
use std::net::IpAddr;

use tracing::{error, trace};

use crate::model::{LeaseKey, LeaseRecord, MacAddress};

/// A lease record plus its reconciliation bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub lease: LeaseRecord,
    /// This entry currently backs the device's coalesced survivor.
    pub in_view: bool,
    /// Content was overwritten since the last time it reached the sink.
    pub pending_update: bool,
}

impl IndexEntry {
    fn new(lease: LeaseRecord) -> Self {
        Self {
            lease,
            in_view: false,
            pending_update: false,
        }
    }
}

/// Result of [`LeaseIndex::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Map from (hardware address, IP address) to the latest lease for the pair.
#[derive(Debug, Default)]
pub struct LeaseIndex {
    entries: BTreeMap<LeaseKey, IndexEntry>,
}

impl LeaseIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a lease, or overwrite the existing one for the same pair.
    ///
    /// An overwrite always marks the entry pending, whether or not the
    /// content differs.
    pub fn upsert(&mut self, lease: LeaseRecord) -> UpsertOutcome {
        let key = lease.key();
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.lease = lease;
            entry.pending_update = true;
            trace!(%key, "lease entry overwritten");
            UpsertOutcome::Updated
        } else {
            self.entries.insert(key, IndexEntry::new(lease));
            trace!(%key, "lease entry inserted");
            UpsertOutcome::Inserted
        }
    }

    /// Remove the entry for a pair. Unknown pairs are logged and ignored.
    pub fn remove(&mut self, hwaddr: MacAddress, ipaddr: IpAddr) -> Option<IndexEntry> {
        let key = LeaseKey { hwaddr, ipaddr };
        let removed = self.entries.remove(&key);
        if removed.is_none() {
            error!(%hwaddr, %ipaddr, "error removing non-existent lease");
        }
        removed
    }

    pub fn get(&self, key: &LeaseKey) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &LeaseKey) -> Option<&mut IndexEntry> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &LeaseKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in key order: by hardware address, then IP address.
    pub fn iter(&self) -> impl Iterator<Item = (&LeaseKey, &IndexEntry)> {
        self.entries.iter()
    }

    /// Keys of one device's entries, in IP order.
    pub fn keys_for(&self, hwaddr: MacAddress) -> Vec<LeaseKey> {
        self.entries
            .keys()
            .skip_while(|k| k.hwaddr < hwaddr)
            .take_while(|k| k.hwaddr == hwaddr)
            .copied()
            .collect()
    }

    /// Distinct hardware addresses present, in order.
    pub fn devices(&self) -> Vec<MacAddress> {
        let mut devices: Vec<MacAddress> = self.entries.keys().map(|k| k.hwaddr).collect();
        devices.dedup();
        devices
    }

    /// Set `in_view` on exactly the given keys.
    pub(crate) fn mark_in_view<'a>(&mut self, keys: impl IntoIterator<Item = &'a LeaseKey>) {
        for entry in self.entries.values_mut() {
            entry.in_view = false;
        }
        for key in keys {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.in_view = true;
            }
        }
    }
}
