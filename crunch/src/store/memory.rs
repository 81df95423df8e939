use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SyncResult;
use crate::store::base::{BatchWriteReport, CrunchStore};
use crate::types::{CrunchRecord, LineNumber};

#[derive(Debug, Default)]
struct Inner {
    /// Stored records keyed by `(caller, address)`, mirroring the table's uniqueness constraint.
    rows: BTreeMap<(String, String), CrunchRecord>,
    /// Size of every batch submitted, in submission order.
    batch_sizes: Vec<usize>,
}

/// In-memory [`CrunchStore`] for tests and local experiments.
///
/// Applies the same uniqueness rule as the `crunch` table: an address is stored at most once per
/// caller, later occurrences are reported as conflicts.
#[derive(Debug, Clone, Default)]
pub struct MemoryCrunchStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCrunchStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the records stored for `caller` ordered by line number.
    pub async fn records(&self, caller: &str) -> Vec<CrunchRecord> {
        let inner = self.inner.lock().await;

        let mut records: Vec<CrunchRecord> = inner
            .rows
            .iter()
            .filter(|((row_caller, _), _)| row_caller == caller)
            .map(|(_, record)| record.clone())
            .collect();
        records.sort_by_key(|record| record.line_number);

        records
    }

    /// Returns the size of every batch submitted to [`CrunchStore::write_batch`].
    pub async fn batch_sizes(&self) -> Vec<usize> {
        self.inner.lock().await.batch_sizes.clone()
    }
}

impl CrunchStore for MemoryCrunchStore {
    async fn last_line_number(&self, caller: &str) -> SyncResult<Option<LineNumber>> {
        let inner = self.inner.lock().await;

        Ok(inner
            .rows
            .iter()
            .filter(|((row_caller, _), _)| row_caller == caller)
            .map(|(_, record)| record.line_number)
            .max())
    }

    async fn write_batch(
        &self,
        caller: &str,
        records: &[CrunchRecord],
    ) -> SyncResult<BatchWriteReport> {
        let mut inner = self.inner.lock().await;
        inner.batch_sizes.push(records.len());

        let mut report = BatchWriteReport::default();
        for record in records {
            let key = (caller.to_owned(), record.address.clone());
            if inner.rows.contains_key(&key) {
                debug!(
                    caller,
                    line_number = record.line_number,
                    address = %record.address,
                    "address already stored, skipping record"
                );
                report.conflicts.push(record.line_number);
                continue;
            }

            inner.rows.insert(key, record.clone());
            report.inserted += 1;
        }

        Ok(report)
    }
}
