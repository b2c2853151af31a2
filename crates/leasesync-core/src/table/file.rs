// ── File-backed lease table ──
//
// The whole table is kept as a pretty-printed JSON array. Every mutation
// rewrites it through a sibling temporary file and a rename, so readers
// never observe a half-written table.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::memory::MemoryTable;
use super::{LeaseRow, LeaseTable, Operation, RowFilter, UpsertResult};
use crate::error::CoreError;

/// Lease table persisted to a JSON file.
#[derive(Debug)]
pub struct JsonFileTable {
    path: PathBuf,
    rows: MemoryTable,
}

impl JsonFileTable {
    /// Open the table at `path`. A missing file is an empty table; it is
    /// created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let rows = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => Vec::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), rows = rows.len(), "opened lease table");
        Ok(Self {
            path,
            rows: MemoryTable::from_rows(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Row for `hwaddr`, compared through `normalize_hwaddr`.
    pub fn find_hwaddr(&self, hwaddr: &str) -> Option<&LeaseRow> {
        self.rows.find_hwaddr(hwaddr)
    }

    /// Drop every row and persist the empty table.
    pub fn clear(&mut self) -> Result<usize, CoreError> {
        let removed = self.rows.len();
        self.rows.clear();
        self.flush()?;
        Ok(removed)
    }

    fn flush(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.rows.rows())?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        trace!(path = %self.path.display(), rows = self.rows.len(), "lease table flushed");
        Ok(())
    }

    fn flush_for(&self, operation: Operation, filter: &RowFilter) -> Result<(), CoreError> {
        self.flush().map_err(|e| CoreError::Store {
            operation,
            hwaddr: filter.hwaddr(),
            reason: e.to_string(),
        })
    }
}

// A failed flush leaves the mutation applied in memory. There is no
// rollback; the next successful flush writes the whole table, including it.
impl LeaseTable for JsonFileTable {
    fn upsert_where(&mut self, filter: &RowFilter, row: LeaseRow) -> Result<UpsertResult, CoreError> {
        let result = self.rows.apply_upsert(filter, row);
        self.flush_for(Operation::Upsert, filter)?;
        Ok(result)
    }

    fn delete_where(&mut self, filter: &RowFilter) -> Result<usize, CoreError> {
        let removed = self.rows.apply_delete(filter);
        if removed > 0 {
            self.flush_for(Operation::Delete, filter)?;
        }
        Ok(removed)
    }

    fn rows(&self) -> Vec<LeaseRow> {
        self.rows.rows()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::MacAddress;
    use crate::table::Condition;

    fn row(hwaddr: &str, lease_time: i64) -> LeaseRow {
        LeaseRow {
            hwaddr: hwaddr.into(),
            inet_addr: "192.168.1.10".into(),
            hostname: "printer".into(),
            fingerprint: String::new(),
            vendor_class: String::new(),
            lease_time,
        }
    }

    fn by_mac(mac: &str) -> RowFilter {
        let mac: MacAddress = mac.parse().unwrap();
        RowFilter::new().and(Condition::hwaddr(&mac))
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let table = JsonFileTable::open(dir.path().join("leases.json")).unwrap();
        assert!(table.rows().is_empty());
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("leases.json");

        let mut table = JsonFileTable::open(&path).unwrap();
        table
            .upsert_where(&by_mac("00:11:22:33:44:55"), row("00:11:22:33:44:55", 3600))
            .unwrap();
        drop(table);

        let reopened = JsonFileTable::open(&path).unwrap();
        assert_eq!(reopened.rows(), vec![row("00:11:22:33:44:55", 3600)]);
    }

    #[test]
    fn delete_and_clear_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");

        let mut table = JsonFileTable::open(&path).unwrap();
        table
            .upsert_where(&by_mac("00:11:22:33:44:55"), row("00:11:22:33:44:55", 60))
            .unwrap();
        table
            .upsert_where(&by_mac("00:11:22:33:44:66"), row("00:11:22:33:44:66", 60))
            .unwrap();
        assert_eq!(table.delete_where(&by_mac("00:11:22:33:44:55")).unwrap(), 1);
        assert_eq!(JsonFileTable::open(&path).unwrap().rows().len(), 1);

        assert_eq!(table.clear().unwrap(), 1);
        assert!(JsonFileTable::open(&path).unwrap().rows().is_empty());
    }

    #[test]
    fn failed_flush_keeps_rows_for_the_next_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        let mut table = JsonFileTable::open(&path).unwrap();

        // A non-empty directory in place of the file makes the rename fail.
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("blocker"), "").unwrap();
        let err = table
            .upsert_where(&by_mac("00:11:22:33:44:55"), row("00:11:22:33:44:55", 60))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Store {
                operation: Operation::Upsert,
                ..
            }
        ));
        assert_eq!(table.rows().len(), 1);

        std::fs::remove_dir_all(&path).unwrap();
        table
            .upsert_where(&by_mac("00:11:22:33:44:66"), row("00:11:22:33:44:66", 60))
            .unwrap();
        assert_eq!(JsonFileTable::open(&path).unwrap().rows().len(), 2);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leases.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(JsonFileTable::open(&path), Err(CoreError::Json(_))));
    }
}
