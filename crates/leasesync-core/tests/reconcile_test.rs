#![allow(clippy::unwrap_used)]
// End-to-end reconciliation tests: engine, coalesced view, and the
// lease table bridge working together.

use pretty_assertions::assert_eq;

use leasesync_core::{
    CoreError, EngineConfig, LEASE_TIME_FRESH, LeaseEngine, LeaseNotification, LeaseRecord,
    LeaseRow, LeaseSink, LeaseTable, MemoryTable, NotifyKind, Operation, RowFilter, UpsertResult,
};

// ── Helpers ─────────────────────────────────────────────────────────

const MAC: &str = "00:11:22:33:44:55";

fn lease(mac: &str, ip: &str, lease_time: u32) -> LeaseRecord {
    LeaseRecord::new(mac.parse().unwrap(), ip.parse().unwrap(), lease_time)
}

fn engine() -> LeaseEngine<leasesync_core::TableBridge<MemoryTable>> {
    LeaseEngine::with_table(EngineConfig::default(), MemoryTable::new())
}

fn row_for(engine: &LeaseEngine<leasesync_core::TableBridge<MemoryTable>>, mac: &str) -> Option<LeaseRow> {
    engine.sink().table().find_hwaddr(mac).cloned()
}

/// Sink counting calls, for asserting the bridge was never reached.
#[derive(Default)]
struct CountingSink {
    calls: Vec<LeaseNotification>,
}

impl LeaseSink for CountingSink {
    fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError> {
        self.calls.push(LeaseNotification {
            kind,
            record: lease.clone(),
        });
        Ok(())
    }
}

/// Table that fails every operation while `down` is set.
#[derive(Default)]
struct FlakyTable {
    inner: MemoryTable,
    down: bool,
}

impl FlakyTable {
    fn outage(&self, operation: Operation, filter: &RowFilter) -> Result<(), CoreError> {
        if self.down {
            return Err(CoreError::Store {
                operation,
                hwaddr: filter.to_string(),
                reason: "connection refused".into(),
            });
        }
        Ok(())
    }
}

impl LeaseTable for FlakyTable {
    fn upsert_where(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<UpsertResult, CoreError> {
        self.outage(Operation::Upsert, filter)?;
        self.inner.upsert_where(filter, row)
    }

    fn delete_where(&mut self, filter: &RowFilter) -> Result<usize, CoreError> {
        self.outage(Operation::Delete, filter)?;
        self.inner.delete_where(filter)
    }

    fn rows(&self) -> Vec<LeaseRow> {
        self.inner.rows()
    }
}

// ── Properties ──────────────────────────────────────────────────────

#[test]
fn test_acquire_then_release_round_trip() {
    let mut engine = engine();
    let record = lease(MAC, "192.168.1.10", 3600);

    let outcome = engine.acquire(record.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::acquired(record.clone())]);
    assert!(row_for(&engine, MAC).is_some());

    let outcome = engine.release(record.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::released(record)]);
    assert!(engine.index().is_empty());
    assert!(engine.view().is_empty());
    assert!(row_for(&engine, MAC).is_none());
}

#[test]
fn test_silent_takeover_by_longer_lease() {
    let mut engine = engine();
    let a = lease(MAC, "10.0.0.1", 100);
    let b = lease(MAC, "10.0.0.2", 200);

    assert_eq!(engine.acquire(a.clone()).notifications.len(), 1);
    let outcome = engine.acquire(b.clone());

    assert!(outcome.is_quiet());
    let survivor = engine.view().get(&b.hwaddr).unwrap();
    assert_eq!(survivor.lease, b);
    // The persisted row still reflects the first acquisition.
    assert_eq!(row_for(&engine, MAC).unwrap().inet_addr, "10.0.0.1");
}

#[test]
fn test_pending_update_refresh_emits_once() {
    let mut engine = engine();
    let a = lease(MAC, "10.0.0.1", 100);
    engine.acquire(a.clone());

    let a_prime = lease(MAC, "10.0.0.1", 80).with_hostname("renamed");
    let outcome = engine.acquire(a_prime.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::acquired(a_prime.clone())]);

    let entry = engine.index().get(&a_prime.key()).unwrap();
    assert!(!entry.pending_update);
    assert!(engine.rebuild().is_quiet());

    let row = row_for(&engine, MAC).unwrap();
    assert_eq!(row.hostname, "renamed");
    assert_eq!(row.lease_time, 80);
}

#[test]
fn test_identical_renotification_still_refreshes() {
    let mut engine = engine();
    let a = lease(MAC, "10.0.0.1", 100);
    engine.acquire(a.clone());
    let outcome = engine.acquire(a.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::acquired(a)]);
}

#[test]
fn test_unknown_release_is_noop() {
    let mut engine = LeaseEngine::new(EngineConfig::default(), CountingSink::default());
    engine.acquire(lease(MAC, "192.168.1.10", 3600));
    let calls_before = engine.sink().calls.len();

    let outcome = engine.release(lease("aa:bb:cc:dd:ee:ff", "10.0.0.5", 0));

    assert!(outcome.unknown_release);
    assert!(outcome.is_quiet());
    assert_eq!(engine.sink().calls.len(), calls_before);
    assert_eq!(engine.index().len(), 1);
    assert_eq!(engine.view().len(), 1);
}

#[test]
fn test_zero_duration_acquisition_is_never_a_delete() {
    let mut engine = engine();
    engine.acquire(lease(MAC, "192.168.1.10", 0));

    let row = row_for(&engine, MAC).unwrap();
    assert_eq!(row.lease_time, LEASE_TIME_FRESH);
}

#[test]
fn test_uniqueness_over_mixed_sequence() {
    let mut engine = LeaseEngine::new(EngineConfig::default(), CountingSink::default());
    let macs = ["00:00:00:00:00:01", "00:00:00:00:00:02", "00:00:00:00:00:03"];
    let ips = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"];

    // Deterministic linear congruential walk over acquire/release events.
    let mut state: u32 = 7;
    for _ in 0..400 {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let mac = macs[(state >> 8) as usize % macs.len()];
        let ip = ips[(state >> 12) as usize % ips.len()];
        let lease_time = (state >> 16) % 500;
        let record = lease(mac, ip, lease_time);

        let outcome = if (state >> 20) % 3 == 0 {
            engine.release(record)
        } else {
            engine.acquire(record)
        };

        // At most one notification per device per pass.
        let mut devices: Vec<String> = outcome
            .notifications
            .iter()
            .map(|n| n.record.hwaddr.to_string())
            .collect();
        let emitted = devices.len();
        devices.dedup();
        assert_eq!(devices.len(), emitted);

        // One survivor per device, each backed by a live index entry.
        assert_eq!(engine.view().len(), engine.index().devices().len());
        for (mac, survivor) in engine.view().iter() {
            let entry = engine.index().get(&survivor.key).unwrap();
            assert_eq!(&survivor.key.hwaddr, mac);
            assert_eq!(entry.lease, survivor.lease);
            assert!(entry.in_view);
        }
    }
}

#[test]
fn test_persistence_failure_self_heals_on_next_event() {
    let table = FlakyTable {
        down: true,
        ..FlakyTable::default()
    };
    let mut engine = LeaseEngine::with_table(EngineConfig::default(), table);

    let outcome = engine.acquire(lease(MAC, "192.168.1.10", 3600));
    assert_eq!(outcome.failures, 1);
    assert_eq!(engine.view().len(), 1);
    assert!(engine.sink().table().rows().is_empty());

    engine.sink_mut().table_mut().down = false;
    let outcome = engine.acquire(lease(MAC, "192.168.1.10", 3500));
    assert_eq!(outcome.failures, 0);
    assert_eq!(engine.sink().table().rows()[0].lease_time, 3500);
}

// ── Scenario ────────────────────────────────────────────────────────

#[test]
fn test_multi_address_device_scenario() {
    let mut engine = engine();
    let first = lease(MAC, "192.168.1.10", 3600);
    let second = lease(MAC, "192.168.1.11", 7200);

    // 1. First address: announced and persisted.
    let outcome = engine.acquire(first.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::acquired(first.clone())]);
    assert_eq!(row_for(&engine, MAC).unwrap().lease_time, 3600);

    // 2. Longer lease on a second address: silent takeover, row untouched.
    let outcome = engine.acquire(second.clone());
    assert!(outcome.is_quiet());
    let row = row_for(&engine, MAC).unwrap();
    assert_eq!(row.inet_addr, "192.168.1.10");
    assert_eq!(row.lease_time, 3600);

    // 3. Releasing the survivor's address leaves the device present; the
    //    remaining entry is promoted and announced.
    let outcome = engine.release(second);
    assert!(engine.index().contains(&first.key()));
    assert_eq!(outcome.notifications, vec![LeaseNotification::acquired(first.clone())]);
    assert_eq!(engine.view().get(&first.hwaddr).unwrap().lease, first);
    let row = row_for(&engine, MAC).unwrap();
    assert_eq!(row.inet_addr, "192.168.1.10");
    assert_eq!(engine.sink().table().len(), 1);

    // 4. Releasing the last address removes the device and its row.
    let outcome = engine.release(first.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::released(first)]);
    assert!(row_for(&engine, MAC).is_none());
}

#[test]
fn test_release_after_silent_takeover_clears_row() {
    let mut engine = engine();
    let first = lease(MAC, "192.168.1.10", 3600);
    let second = lease(MAC, "192.168.1.11", 7200);

    engine.acquire(first.clone());
    assert!(engine.acquire(second.clone()).is_quiet());
    assert_eq!(row_for(&engine, MAC).unwrap().inet_addr, "192.168.1.10");

    // Dropping the stale address is quiet; the row still names it.
    assert!(engine.release(first).is_quiet());
    assert_eq!(row_for(&engine, MAC).unwrap().inet_addr, "192.168.1.10");

    let outcome = engine.release(second.clone());
    assert_eq!(outcome.notifications, vec![LeaseNotification::released(second)]);
    assert!(engine.index().is_empty());
    assert!(engine.view().is_empty());
    assert!(engine.sink().table().rows().is_empty());
}

#[test]
fn test_releasing_non_survivor_is_quiet() {
    let mut engine = engine();
    let long = lease(MAC, "192.168.1.10", 7200);
    let short = lease(MAC, "192.168.1.11", 60);
    engine.acquire(long.clone());
    engine.acquire(short.clone());

    let outcome = engine.release(short);
    assert!(outcome.is_quiet());
    assert_eq!(engine.view().get(&long.hwaddr).unwrap().lease, long);
}
