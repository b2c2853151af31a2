// ── In-process lease table ──

use super::{LeaseRow, LeaseTable, RowFilter, UpsertResult};
use crate::error::CoreError;

/// Lease table kept in memory. Rows keep insertion order; an upsert that
/// matches takes the position of the first matching row.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    rows: Vec<LeaseRow>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<LeaseRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First row whose hardware address matches, case-insensitively.
    pub fn find_hwaddr(&self, hwaddr: &str) -> Option<&LeaseRow> {
        let key = crate::model::normalize_hwaddr(hwaddr);
        self.rows
            .iter()
            .find(|r| crate::model::normalize_hwaddr(&r.hwaddr) == key)
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub(crate) fn apply_upsert(&mut self, filter: &RowFilter, row: LeaseRow) -> UpsertResult {
        let Some(first) = self.rows.iter().position(|r| filter.matches(r)) else {
            self.rows.push(row);
            return UpsertResult::Inserted;
        };

        let before = self.rows.len();
        let mut index = 0;
        self.rows.retain(|r| {
            let keep = index == first || !filter.matches(r);
            index += 1;
            keep
        });
        let collapsed = before - self.rows.len() + 1;
        self.rows[first] = row;
        UpsertResult::Replaced(collapsed)
    }

    pub(crate) fn apply_delete(&mut self, filter: &RowFilter) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| !filter.matches(r));
        before - self.rows.len()
    }
}

impl LeaseTable for MemoryTable {
    fn upsert_where(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<UpsertResult, CoreError> {
        Ok(self.apply_upsert(filter, row))
    }

    fn delete_where(&mut self, filter: &RowFilter) -> Result<usize, CoreError> {
        Ok(self.apply_delete(filter))
    }

    fn rows(&self) -> Vec<LeaseRow> {
        self.rows.clone()
    }
}
