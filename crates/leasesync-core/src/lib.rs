//! DHCP lease reconciliation for the leased-address table.
//!
//! Raw lease notifications are noisy: one device can hold several
//! addresses at once and the same lease is often reported repeatedly.
//! This crate turns that stream into at most one notification per device
//! per event and persists the result as one row per device:
//!
//! - **[`LeaseIndex`]**: every active (MAC, IP) pair with its latest
//!   record and pending-update flag.
//! - **[`CoalescedView`]**: one survivor per device, rebuilt from the
//!   index after every mutation and diffed against the previous pass.
//! - **[`LeaseEngine`]**: owns both and dispatches the resulting
//!   [`LeaseNotification`]s to an injected [`LeaseSink`].
//! - **[`TableBridge`]**: the production sink, issuing conditional
//!   upserts and deletes against a [`LeaseTable`] ([`MemoryTable`],
//!   [`JsonFileTable`]).

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod sink;
pub mod store;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{EngineConfig, MatchPolicy};
pub use engine::{EngineStats, LeaseEngine, PassOutcome};
pub use error::CoreError;
pub use model::{
    LeaseEvent, LeaseKey, LeaseNotification, LeaseRecord, MacAddress, NotifyKind,
    normalize_hwaddr,
};
pub use sink::{LeaseSink, TableBridge, lease_row};
pub use store::{CoalescedView, IndexEntry, LeaseIndex, Survivor, UpsertOutcome};
pub use table::{
    Column, Condition, JsonFileTable, LEASE_TIME_DELETE, LEASE_TIME_FRESH, LeaseRow, LeaseTable,
    MemoryTable, Operation, RowFilter, UpsertResult,
};
