// ── Reconciliation engine ──
//
// Owns both lease indexes and the injected sink. One call to `handle`
// runs the whole index-mutate, rebuild, diff, notify, persist sequence
// to completion; nothing in here suspends or spawns.

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::model::{LeaseEvent, LeaseNotification, LeaseRecord};
use crate::sink::{LeaseSink, TableBridge};
use crate::store::{CoalescedView, LeaseIndex, UpsertOutcome};
use crate::table::LeaseTable;

/// What one event produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Notifications handed to the sink, in dispatch order.
    pub notifications: Vec<LeaseNotification>,
    /// How many of those the sink rejected.
    pub failures: usize,
    /// The event released a lease the index never held.
    pub unknown_release: bool,
}

impl PassOutcome {
    pub fn is_quiet(&self) -> bool {
        self.notifications.is_empty()
    }
}

/// Running totals across every handled event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub events: u64,
    pub notifications: u64,
    pub failures: u64,
    pub unknown_releases: u64,
}

/// DHCP lease reconciliation engine.
#[derive(Debug)]
pub struct LeaseEngine<S> {
    config: EngineConfig,
    index: LeaseIndex,
    view: CoalescedView,
    sink: S,
    stats: EngineStats,
}

impl<T: LeaseTable> LeaseEngine<TableBridge<T>> {
    /// Engine persisting into `table` with the configured match policy.
    pub fn with_table(config: EngineConfig, table: T) -> Self {
        let bridge = TableBridge::new(table, config.match_policy);
        Self::new(config, bridge)
    }
}

impl<S: LeaseSink> LeaseEngine<S> {
    pub fn new(config: EngineConfig, sink: S) -> Self {
        Self {
            config,
            index: LeaseIndex::new(),
            view: CoalescedView::new(),
            sink,
            stats: EngineStats::default(),
        }
    }

    /// Process one raw lease notification.
    pub fn handle(&mut self, event: LeaseEvent) -> PassOutcome {
        self.stats.events += 1;

        if !self.config.coalesce {
            let notification = if event.released {
                LeaseNotification::released(event.record)
            } else {
                LeaseNotification::acquired(event.record)
            };
            return self.dispatch(vec![notification], false);
        }

        let unknown_release = !self.apply(event);
        let notifications = self.view.rebuild(&mut self.index);
        self.dispatch(notifications, unknown_release)
    }

    pub fn acquire(&mut self, record: LeaseRecord) -> PassOutcome {
        self.handle(LeaseEvent::acquired(record))
    }

    pub fn release(&mut self, record: LeaseRecord) -> PassOutcome {
        self.handle(LeaseEvent::released(record))
    }

    /// Run a coalescing pass without mutating the index.
    pub fn rebuild(&mut self) -> PassOutcome {
        if !self.config.coalesce {
            return PassOutcome::default();
        }
        let notifications = self.view.rebuild(&mut self.index);
        self.dispatch(notifications, false)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn index(&self) -> &LeaseIndex {
        &self.index
    }

    pub fn view(&self) -> &CoalescedView {
        &self.view
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Mutate the primary index. Returns `false` for an unknown release.
    fn apply(&mut self, event: LeaseEvent) -> bool {
        let LeaseEvent { released, record } = event;
        if released {
            let Some(removed) = self.index.remove(record.hwaddr, record.ipaddr) else {
                self.stats.unknown_releases += 1;
                return false;
            };
            if removed.in_view {
                self.view.detach(record.hwaddr);
            }
            return true;
        }

        let hwaddr = record.hwaddr;
        let ipaddr = record.ipaddr;
        let outcome = self.index.upsert(record);
        if outcome == UpsertOutcome::Updated {
            debug!(%hwaddr, %ipaddr, "lease re-notified, update pending");
        }
        true
    }

    fn dispatch(
        &mut self,
        notifications: Vec<LeaseNotification>,
        unknown_release: bool,
    ) -> PassOutcome {
        let mut failures = 0;
        for n in &notifications {
            self.stats.notifications += 1;
            if let Err(e) = self.sink.notify(n.kind, &n.record) {
                failures += 1;
                self.stats.failures += 1;
                warn!(
                    kind = %n.kind,
                    hwaddr = %n.record.hwaddr,
                    ipaddr = %n.record.ipaddr,
                    hostname = %n.record.hostname,
                    error = %e,
                    "error processing DHCP lease entry"
                );
            }
        }

        debug!(
            notifications = notifications.len(),
            failures,
            devices = self.view.len(),
            leases = self.index.len(),
            "lease event handled"
        );

        PassOutcome {
            notifications,
            failures,
            unknown_release,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::model::NotifyKind;
    use crate::table::{MemoryTable, Operation};

    /// Sink that records every notification and can be told to fail.
    #[derive(Default)]
    struct Recorder {
        seen: Vec<(NotifyKind, LeaseRecord)>,
        fail: bool,
    }

    impl LeaseSink for Recorder {
        fn notify(&mut self, kind: NotifyKind, lease: &LeaseRecord) -> Result<(), CoreError> {
            self.seen.push((kind, lease.clone()));
            if self.fail {
                return Err(CoreError::Store {
                    operation: Operation::Upsert,
                    hwaddr: lease.hwaddr.to_key(),
                    reason: "store unavailable".into(),
                });
            }
            Ok(())
        }
    }

    fn lease(mac: &str, ip: &str, lease_time: u32) -> LeaseRecord {
        LeaseRecord::new(mac.parse().unwrap(), ip.parse().unwrap(), lease_time)
    }

    #[test]
    fn sink_failure_keeps_memory_state() {
        let mut engine = LeaseEngine::new(
            EngineConfig::default(),
            Recorder {
                fail: true,
                ..Recorder::default()
            },
        );
        let outcome = engine.acquire(lease("00:11:22:33:44:55", "10.0.0.1", 60));
        assert_eq!(outcome.failures, 1);
        assert_eq!(engine.view().len(), 1);
        assert_eq!(engine.stats().failures, 1);

        // Later events still flow.
        let outcome = engine.acquire(lease("00:11:22:33:44:66", "10.0.0.2", 60));
        assert_eq!(outcome.notifications.len(), 1);
        assert_eq!(engine.sink().seen.len(), 2);
    }

    #[test]
    fn passthrough_forwards_raw_events() {
        let mut engine = LeaseEngine::new(EngineConfig::passthrough(), Recorder::default());
        engine.acquire(lease("00:11:22:33:44:55", "10.0.0.1", 100));
        engine.acquire(lease("00:11:22:33:44:55", "10.0.0.2", 200));
        engine.release(lease("00:11:22:33:44:55", "10.0.0.9", 0));

        let kinds: Vec<NotifyKind> = engine.sink().seen.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            kinds,
            vec![NotifyKind::Acquired, NotifyKind::Acquired, NotifyKind::Released]
        );
        assert!(engine.index().is_empty());
    }

    #[test]
    fn unknown_release_is_reported_and_counted() {
        let mut engine = LeaseEngine::new(EngineConfig::default(), Recorder::default());
        let outcome = engine.release(lease("aa:bb:cc:dd:ee:ff", "10.0.0.5", 0));
        assert!(outcome.unknown_release);
        assert!(outcome.is_quiet());
        assert_eq!(engine.stats().unknown_releases, 1);
    }

    #[test]
    fn with_table_uses_configured_policy() {
        let engine = LeaseEngine::with_table(EngineConfig::passthrough(), MemoryTable::new());
        assert_eq!(engine.sink().policy(), engine.config().match_policy);
    }
}
