//! Resumable ingestion of `salt => address => reward` result files into Postgres.
//!
//! A run resolves the highest line already stored for the caller, streams the source file from
//! the following line, derives zero-byte statistics for every address and commits the records in
//! bounded batches. Duplicate addresses are skipped per record without failing their batch.

pub mod checkpoint;
pub mod committer;
pub mod error;
#[cfg(feature = "failpoints")]
pub mod failpoints;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod store;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod transform;
pub mod types;
