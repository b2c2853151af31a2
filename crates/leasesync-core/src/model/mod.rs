// ── Lease domain model ──

pub mod hwaddr;
pub mod lease;

pub use hwaddr::{MacAddress, normalize_hwaddr};
pub use lease::{LeaseEvent, LeaseKey, LeaseNotification, LeaseRecord, NotifyKind};
