// ── External lease table ──
//
// Row shape and conditional operations of the one table the persistence
// bridge writes. Implementations decide where the rows live.

mod file;
mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::{MacAddress, normalize_hwaddr};

pub use file::JsonFileTable;
pub use memory::MemoryTable;

/// `lease_time` value that asks the store to drop the row.
pub const LEASE_TIME_DELETE: i64 = 0;

/// `lease_time` written for an acquisition whose remaining time rounds to 0.
pub const LEASE_TIME_FRESH: i64 = -1;

/// One row of the leased-address table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseRow {
    /// Lower-cased hardware address; selection key.
    pub hwaddr: String,
    pub inet_addr: String,
    pub hostname: String,
    pub fingerprint: String,
    pub vendor_class: String,
    pub lease_time: i64,
}

/// Selectable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Column {
    Hwaddr,
    InetAddr,
}

/// `column == value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub column: Column,
    pub value: String,
}

impl Condition {
    pub fn hwaddr(mac: &MacAddress) -> Self {
        Self {
            column: Column::Hwaddr,
            value: mac.to_key(),
        }
    }

    pub fn inet_addr(value: impl Into<String>) -> Self {
        Self {
            column: Column::InetAddr,
            value: value.into(),
        }
    }

    pub fn matches(&self, row: &LeaseRow) -> bool {
        match self.column {
            Column::Hwaddr => normalize_hwaddr(&row.hwaddr) == normalize_hwaddr(&self.value),
            Column::InetAddr => row.inet_addr == self.value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {:?}", self.column, self.value)
    }
}

/// Conjunction of conditions. An empty filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    conditions: Vec<Condition>,
}

impl RowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn matches(&self, row: &LeaseRow) -> bool {
        self.conditions.iter().all(|c| c.matches(row))
    }

    /// Hardware address this filter selects on, for error reporting.
    pub(crate) fn hwaddr(&self) -> String {
        self.conditions
            .iter()
            .find(|c| c.column == Column::Hwaddr)
            .map_or_else(|| "*".into(), |c| c.value.clone())
    }
}

impl fmt::Display for RowFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.conditions.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join(" && "))
    }
}

/// Store operation, used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Upsert,
    Delete,
}

/// What an upsert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    Inserted,
    /// Number of matching rows collapsed into the new one.
    Replaced(usize),
}

/// Row-oriented store holding the leased-address table.
pub trait LeaseTable {
    /// Replace every row matching `filter` with `row`, or insert it when
    /// nothing matches.
    fn upsert_where(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<UpsertResult, CoreError>;

    /// Delete every row matching `filter`, returning how many were removed.
    fn delete_where(&mut self, filter: &RowFilter) -> Result<usize, CoreError>;

    /// Current rows in storage order.
    fn rows(&self) -> Vec<LeaseRow>;
}

impl<T: LeaseTable + ?Sized> LeaseTable for Box<T> {
    fn upsert_where(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<UpsertResult, CoreError> {
        (**self).upsert_where(filter, row)
    }

    fn delete_where(&mut self, filter: &RowFilter) -> Result<usize, CoreError> {
        (**self).delete_where(filter)
    }

    fn rows(&self) -> Vec<LeaseRow> {
        (**self).rows()
    }
}
