//! Bounded batching of records into store writes.

use std::mem;

use metrics::counter;
use tracing::{error, info};

use crate::error::SyncError;
use crate::metrics::{
    CALLER_LABEL, CRUNCH_BATCHES_ABANDONED_TOTAL, CRUNCH_BATCHES_COMMITTED_TOTAL,
    CRUNCH_RECORDS_INSERTED_TOTAL, CRUNCH_RECORDS_SKIPPED_TOTAL,
};
use crate::store::CrunchStore;
use crate::types::CrunchRecord;

/// Final state of a flushed batch.
#[derive(Debug)]
pub enum BatchOutcome {
    /// Every record of the batch was stored.
    Committed { inserted: usize },
    /// The batch committed but some records were skipped since their address was already stored.
    PartiallyConflicted { inserted: usize, skipped: usize },
    /// The write failed and nothing of the batch was stored.
    Abandoned { records: usize, error: SyncError },
}

impl BatchOutcome {
    /// Number of records stored by this batch.
    pub fn inserted(&self) -> usize {
        match self {
            BatchOutcome::Committed { inserted }
            | BatchOutcome::PartiallyConflicted { inserted, .. } => *inserted,
            BatchOutcome::Abandoned { .. } => 0,
        }
    }

    /// Number of records skipped on a uniqueness conflict.
    pub fn skipped(&self) -> usize {
        match self {
            BatchOutcome::PartiallyConflicted { skipped, .. } => *skipped,
            _ => 0,
        }
    }

    /// Returns `true` if the batch was committed, with or without conflicts.
    pub fn is_committed(&self) -> bool {
        !matches!(self, BatchOutcome::Abandoned { .. })
    }
}

/// Accumulates records and writes them to a [`CrunchStore`] once `max_size` is reached.
///
/// Each flush is one write of at most `max_size` records. A failed write abandons the batch: the
/// failure is logged and reported as [`BatchOutcome::Abandoned`], the buffer is cleared and the
/// committer keeps accepting records.
#[derive(Debug)]
pub struct BatchCommitter<'a, S> {
    store: &'a S,
    caller: &'a str,
    max_size: usize,
    batch: Vec<CrunchRecord>,
}

impl<'a, S> BatchCommitter<'a, S>
where
    S: CrunchStore,
{
    pub fn new(store: &'a S, caller: &'a str, max_size: usize) -> Self {
        let max_size = max_size.max(1);

        Self {
            store,
            caller,
            max_size,
            batch: Vec::with_capacity(max_size),
        }
    }

    /// Number of records waiting for the next flush.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Adds a record, flushing the batch when it reaches the threshold.
    pub async fn push(&mut self, record: CrunchRecord) -> Option<BatchOutcome> {
        self.batch.push(record);

        if self.batch.len() >= self.max_size {
            return self.flush().await;
        }

        None
    }

    /// Writes the pending records, returning `None` if there are none.
    pub async fn flush(&mut self) -> Option<BatchOutcome> {
        if self.batch.is_empty() {
            return None;
        }

        let records = mem::replace(&mut self.batch, Vec::with_capacity(self.max_size));
        Some(self.commit(&records).await)
    }

    async fn commit(&self, records: &[CrunchRecord]) -> BatchOutcome {
        let caller = self.caller;
        let batch_size = records.len();
        let first_line = records.first().map(|record| record.line_number);
        let last_line = records.last().map(|record| record.line_number);

        match self.store.write_batch(caller, records).await {
            Ok(report) => {
                let inserted = report.inserted;
                let skipped = report.skipped();

                counter!(CRUNCH_BATCHES_COMMITTED_TOTAL, CALLER_LABEL => caller.to_owned())
                    .increment(1);
                counter!(CRUNCH_RECORDS_INSERTED_TOTAL, CALLER_LABEL => caller.to_owned())
                    .increment(inserted as u64);
                counter!(CRUNCH_RECORDS_SKIPPED_TOTAL, CALLER_LABEL => caller.to_owned())
                    .increment(skipped as u64);

                info!(
                    caller,
                    batch_size,
                    first_line,
                    last_line,
                    inserted,
                    skipped,
                    "inserted {inserted} records"
                );

                if skipped == 0 {
                    BatchOutcome::Committed { inserted }
                } else {
                    BatchOutcome::PartiallyConflicted { inserted, skipped }
                }
            }
            Err(err) => {
                counter!(CRUNCH_BATCHES_ABANDONED_TOTAL, CALLER_LABEL => caller.to_owned())
                    .increment(1);

                error!(
                    caller,
                    batch_size,
                    first_line,
                    last_line,
                    error = %err,
                    "batch write failed, abandoning batch"
                );

                BatchOutcome::Abandoned {
                    records: batch_size,
                    error: err,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::bail;
    use crate::error::{ErrorKind, SyncResult};
    use crate::store::BatchWriteReport;
    use crate::store::memory::MemoryCrunchStore;
    use crate::types::LineNumber;

    const CALLER: &str = "0xcaller";

    /// Fails every write after counting it.
    #[derive(Default)]
    struct BrokenStore {
        attempts: AtomicUsize,
    }

    impl CrunchStore for BrokenStore {
        async fn last_line_number(&self, _caller: &str) -> SyncResult<Option<LineNumber>> {
            Ok(None)
        }

        async fn write_batch(
            &self,
            _caller: &str,
            _records: &[CrunchRecord],
        ) -> SyncResult<BatchWriteReport> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            bail!(ErrorKind::QueryFailed, "Database operation failed");
        }
    }

    fn record(address: &str, line_number: LineNumber) -> CrunchRecord {
        CrunchRecord {
            salt: format!("salt-{line_number}"),
            address: address.to_owned(),
            reward: BigDecimal::from_str("10").unwrap(),
            total_zeroes: 0,
            leading_zeroes: 0,
            line_number,
        }
    }

    #[tokio::test]
    async fn push_flushes_at_threshold() {
        let store = MemoryCrunchStore::new();
        let mut committer = BatchCommitter::new(&store, CALLER, 2);

        assert!(committer.push(record("0x01", 1)).await.is_none());
        let outcome = committer.push(record("0x02", 2)).await.unwrap();

        assert!(matches!(outcome, BatchOutcome::Committed { inserted: 2 }));
        assert!(committer.is_empty());
        assert_eq!(store.batch_sizes().await, vec![2]);
    }

    #[tokio::test]
    async fn flush_of_empty_batch_writes_nothing() {
        let store = MemoryCrunchStore::new();
        let mut committer = BatchCommitter::new(&store, CALLER, 10);

        assert!(committer.flush().await.is_none());
        assert!(store.batch_sizes().await.is_empty());
    }

    #[tokio::test]
    async fn flush_writes_partial_batch() {
        let store = MemoryCrunchStore::new();
        let mut committer = BatchCommitter::new(&store, CALLER, 10);

        committer.push(record("0x01", 1)).await;
        committer.push(record("0x02", 2)).await;
        committer.push(record("0x03", 3)).await;
        assert_eq!(committer.len(), 3);

        let outcome = committer.flush().await.unwrap();

        assert_eq!(outcome.inserted(), 3);
        assert_eq!(store.batch_sizes().await, vec![3]);
    }

    #[tokio::test]
    async fn conflicting_record_is_skipped_alone() {
        let store = MemoryCrunchStore::new();
        store
            .write_batch(CALLER, &[record("0x02", 1)])
            .await
            .unwrap();

        let mut committer = BatchCommitter::new(&store, CALLER, 3);
        committer.push(record("0x01", 2)).await;
        committer.push(record("0x02", 3)).await;
        let outcome = committer.push(record("0x03", 4)).await.unwrap();

        assert!(matches!(
            outcome,
            BatchOutcome::PartiallyConflicted {
                inserted: 2,
                skipped: 1
            }
        ));
        let lines: Vec<_> = store
            .records(CALLER)
            .await
            .iter()
            .map(|record| record.line_number)
            .collect();
        assert_eq!(lines, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn failed_write_abandons_batch_and_keeps_going() {
        let store = BrokenStore::default();
        let mut committer = BatchCommitter::new(&store, CALLER, 1);

        let first = committer.push(record("0x01", 1)).await.unwrap();
        let second = committer.push(record("0x02", 2)).await.unwrap();

        let BatchOutcome::Abandoned { records, error } = first else {
            panic!("expected an abandoned batch, got {first:?}");
        };
        assert_eq!(records, 1);
        assert_eq!(error.kind(), ErrorKind::QueryFailed);
        assert!(!second.is_committed());
        assert!(committer.is_empty());
        assert_eq!(store.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_threshold_behaves_as_one() {
        let store = MemoryCrunchStore::new();
        let mut committer = BatchCommitter::new(&store, CALLER, 0);

        assert!(committer.push(record("0x01", 1)).await.is_some());
    }
}
