//! Metrics definitions for sync monitoring.
//!
//! Names are registered with the global [`metrics`] recorder, which is a no-op until a recorder
//! is installed.

/// Label for the caller identity in metrics.
pub const CALLER_LABEL: &str = "caller";

/// Counter for records stored by committed batches.
pub const CRUNCH_RECORDS_INSERTED_TOTAL: &str = "crunch_records_inserted_total";

/// Counter for records skipped because their address was already stored.
pub const CRUNCH_RECORDS_SKIPPED_TOTAL: &str = "crunch_records_skipped_total";

/// Counter for batches that committed.
pub const CRUNCH_BATCHES_COMMITTED_TOTAL: &str = "crunch_batches_committed_total";

/// Counter for batches abandoned after a write failure.
pub const CRUNCH_BATCHES_ABANDONED_TOTAL: &str = "crunch_batches_abandoned_total";

/// Counter for source lines dropped for not having exactly three fields.
pub const CRUNCH_MALFORMED_LINES_TOTAL: &str = "crunch_malformed_lines_total";
