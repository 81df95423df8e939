use std::future::Future;

use crate::error::SyncResult;
use crate::types::{CrunchRecord, LineNumber};

/// Result of a committed batch write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchWriteReport {
    /// Number of records stored by the commit.
    pub inserted: usize,
    /// Line numbers of records skipped because their address was already stored for the caller.
    pub conflicts: Vec<LineNumber>,
}

impl BatchWriteReport {
    /// Number of records skipped on a uniqueness conflict.
    pub fn skipped(&self) -> usize {
        self.conflicts.len()
    }
}

/// Trait for systems storing crunch records per caller.
///
/// [`CrunchStore`] implementations own durability: a batch is either committed as a whole, minus
/// the records conflicting with an address already stored for the caller, or not at all.
pub trait CrunchStore {
    /// Returns the highest line number stored for `caller`, or `None` if the caller has no rows.
    fn last_line_number(
        &self,
        caller: &str,
    ) -> impl Future<Output = SyncResult<Option<LineNumber>>> + Send;

    /// Writes `records` for `caller` as a single all-or-nothing unit.
    ///
    /// Records whose address is already stored for `caller` are skipped individually and listed
    /// in [`BatchWriteReport::conflicts`]. Any other failure must leave no record of the batch
    /// behind and is returned as an error.
    fn write_batch(
        &self,
        caller: &str,
        records: &[CrunchRecord],
    ) -> impl Future<Output = SyncResult<BatchWriteReport>> + Send;
}
