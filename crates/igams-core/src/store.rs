//! Log Store — the read source of execution records.
//!
//! The engine only ever reads through [`LogStore`]. Retry policy, write
//! concurrency, and soft deletion are the store's concern.

use crate::error::{ControlError, Result};
use crate::types::ExecutionRecord;
use chrono::NaiveDate;
use std::sync::RwLock;

pub trait LogStore: Send + Sync {
    /// Records for one actor on one date, in creation order. Never includes
    /// soft-deleted records.
    fn fetch_records(&self, actor_id: &str, date: NaiveDate) -> Result<Vec<ExecutionRecord>>;

    /// Records for one actor across an inclusive date range, ordered by date
    /// and then creation order.
    fn fetch_records_range(
        &self,
        actor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExecutionRecord>>;
}

// ---------------------------------------------------------------------------
// MemoryLogStore
// ---------------------------------------------------------------------------

struct Entry {
    record: ExecutionRecord,
    deleted: bool,
}

/// Insertion-ordered in-process store.
#[derive(Default)]
pub struct MemoryLogStore {
    entries: RwLock<Vec<Entry>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = ExecutionRecord>) -> Self {
        let store = Self::new();
        for record in records {
            store.insert(record);
        }
        store
    }

    pub fn insert(&self, record: ExecutionRecord) {
        if let Ok(mut entries) = self.entries.write() {
            entries.push(Entry {
                record,
                deleted: false,
            });
        }
    }

    /// Hide a record from every subsequent fetch. Returns false if the id is unknown.
    pub fn soft_delete(&self, id: &str) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        match entries.iter_mut().find(|e| e.record.id == id && !e.deleted) {
            Some(entry) => {
                entry.deleted = true;
                true
            }
            None => false,
        }
    }

    fn select(&self, keep: impl Fn(&ExecutionRecord) -> bool) -> Result<Vec<ExecutionRecord>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ControlError::DataAccess("memory store lock poisoned".to_string()))?;
        Ok(entries
            .iter()
            .filter(|e| !e.deleted && keep(&e.record))
            .map(|e| e.record.clone())
            .collect())
    }
}

impl LogStore for MemoryLogStore {
    fn fetch_records(&self, actor_id: &str, date: NaiveDate) -> Result<Vec<ExecutionRecord>> {
        self.select(|r| r.actor_id == actor_id && r.execution_date == date)
    }

    fn fetch_records_range(
        &self,
        actor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExecutionRecord>> {
        let mut records = self.select(|r| {
            r.actor_id == actor_id && r.execution_date >= start && r.execution_date <= end
        })?;
        // Stable sort keeps creation order within a day.
        records.sort_by_key(|r| r.execution_date);
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
