// ── Coalescing reconciler ──
//
// Collapses the primary index to one survivor per device and diffs the
// result against the previous pass. Every pass is a full rebuild from
// the index; the view carries no state the index cannot regenerate
// except which entry won last time.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::index::LeaseIndex;
use crate::model::{LeaseKey, LeaseNotification, LeaseRecord, MacAddress};

/// The lease chosen to represent a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Survivor {
    /// Primary index entry backing this survivor.
    pub key: LeaseKey,
    pub lease: LeaseRecord,
}

/// Per-device view derived from the primary index.
#[derive(Debug, Default)]
pub struct CoalescedView {
    survivors: BTreeMap<MacAddress, Survivor>,
    /// Devices whose backing entry was removed since the last pass.
    detached: BTreeSet<MacAddress>,
}

impl CoalescedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the entry backing `hwaddr`'s survivor left the index.
    pub fn detach(&mut self, hwaddr: MacAddress) {
        if self.survivors.contains_key(&hwaddr) {
            self.detached.insert(hwaddr);
        }
    }

    pub fn get(&self, hwaddr: &MacAddress) -> Option<&Survivor> {
        self.survivors.get(hwaddr)
    }

    pub fn len(&self) -> usize {
        self.survivors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survivors.is_empty()
    }

    /// Survivors in hardware-address order.
    pub fn iter(&self) -> impl Iterator<Item = (&MacAddress, &Survivor)> {
        self.survivors.iter()
    }

    /// Rebuild the view from `index` and return the notifications needed
    /// to bring downstream state in line, in hardware-address order.
    ///
    /// For each device the previous survivor is merged against every
    /// candidate in IP order: a strictly longer lease takes over silently,
    /// otherwise a pending survivor is announced once and its flag cleared.
    /// A device emits at most one notification per pass.
    pub fn rebuild(&mut self, index: &mut LeaseIndex) -> Vec<LeaseNotification> {
        let mut previous = std::mem::take(&mut self.survivors);
        let detached = std::mem::take(&mut self.detached);

        let devices: BTreeSet<MacAddress> = previous
            .keys()
            .copied()
            .chain(index.devices())
            .collect();

        let mut notifications = Vec::new();
        for hwaddr in devices {
            let prior = previous.remove(&hwaddr);
            let was_detached = detached.contains(&hwaddr);
            let (survivor, notification) = coalesce_device(index, hwaddr, prior, was_detached);

            if let Some(survivor) = survivor {
                self.survivors.insert(hwaddr, survivor);
            }
            if let Some(notification) = notification {
                notifications.push(notification);
            }
        }

        index.mark_in_view(self.survivors.values().map(|s| &s.key));
        trace!(
            devices = self.survivors.len(),
            notifications = notifications.len(),
            "coalescing pass complete"
        );
        notifications
    }
}

/// Merge one device's candidates against its previous survivor.
fn coalesce_device(
    index: &mut LeaseIndex,
    hwaddr: MacAddress,
    prior: Option<Survivor>,
    detached: bool,
) -> (Option<Survivor>, Option<LeaseNotification>) {
    let candidates = index.keys_for(hwaddr);

    if candidates.is_empty() {
        return match prior {
            Some(gone) => {
                debug!(%hwaddr, ipaddr = %gone.lease.ipaddr, "device released");
                (None, Some(LeaseNotification::released(gone.lease)))
            }
            None => (None, None),
        };
    }

    // A detached survivor no longer has a backing entry; the device is
    // rebuilt from its remaining candidates as if newly seen.
    let mut current = prior
        .filter(|_| !detached)
        .map(|p| p.key)
        .filter(|k| index.contains(k));
    let mut notification = None;

    for candidate in &candidates {
        let Some(cur) = current else {
            let Some(entry) = index.get_mut(candidate) else {
                continue;
            };
            entry.pending_update = false;
            debug!(%hwaddr, ipaddr = %candidate.ipaddr, "device acquired");
            notification = Some(LeaseNotification::acquired(entry.lease.clone()));
            current = Some(*candidate);
            continue;
        };

        let cur_time = index.get(&cur).map_or(0, |e| e.lease.lease_time);
        let Some(cand_time) = index.get(candidate).map(|e| e.lease.lease_time) else {
            continue;
        };

        if cand_time > cur_time {
            debug!(
                %hwaddr,
                from = %cur.ipaddr,
                to = %candidate.ipaddr,
                "longer lease takes over silently"
            );
            current = Some(*candidate);
            continue;
        }

        if notification.is_some() {
            continue;
        }
        if let Some(entry) = index.get_mut(&cur).filter(|e| e.pending_update) {
            entry.pending_update = false;
            debug!(%hwaddr, ipaddr = %cur.ipaddr, "device lease refreshed");
            notification = Some(LeaseNotification::acquired(entry.lease.clone()));
        }
    }

    let survivor = current.and_then(|key| {
        index.get(&key).map(|entry| Survivor {
            key,
            lease: entry.lease.clone(),
        })
    });
    (survivor, notification)
}
