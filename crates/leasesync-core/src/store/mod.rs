// ── Lease state ──
//
// The primary index is ground truth; the coalesced view is derived from
// it after every mutation.

pub mod coalesce;
pub mod index;

pub use coalesce::{CoalescedView, Survivor};
pub use index::{IndexEntry, LeaseIndex, UpsertOutcome};
