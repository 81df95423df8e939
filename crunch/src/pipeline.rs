//! The sync run: checkpoint, scan, transform, commit.

use std::path::PathBuf;

use crunch_config::shared::SyncConfig;
use metrics::counter;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use crate::checkpoint::resolve_checkpoint;
use crate::committer::{BatchCommitter, BatchOutcome};
use crate::error::{ErrorKind, SyncResult};
use crate::metrics::{CALLER_LABEL, CRUNCH_MALFORMED_LINES_TOTAL};
use crate::store::CrunchStore;
use crate::sync_error;
use crate::transform::parse_line;
use crate::types::LineNumber;

/// Settings of a [`SyncPipeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPipelineConfig {
    /// Caller identity the rows are stored and resumed under.
    pub caller: String,
    /// Results file to ingest.
    pub source_path: PathBuf,
    /// Maximum number of records written per batch.
    pub batch_max_size: usize,
}

impl From<&SyncConfig> for SyncPipelineConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            caller: config.caller.clone(),
            source_path: config.source.path.clone(),
            batch_max_size: config.batch.max_size,
        }
    }
}

/// Counters describing a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Line number the run resumed after.
    pub checkpoint: LineNumber,
    /// Number of the last line of the source file, 0 for an empty file.
    pub last_line_number: LineNumber,
    /// Lines read from the source file, including skipped ones.
    pub lines_read: u64,
    /// Lines at or before the checkpoint.
    pub lines_skipped: u64,
    /// Lines dropped for not having exactly three fields.
    pub malformed_lines: u64,
    pub records_inserted: u64,
    pub records_skipped: u64,
    pub batches_committed: u64,
    pub batches_abandoned: u64,
}

impl SyncSummary {
    fn record_outcome(&mut self, outcome: &BatchOutcome) {
        if outcome.is_committed() {
            self.batches_committed += 1;
        } else {
            self.batches_abandoned += 1;
        }

        self.records_inserted += outcome.inserted() as u64;
        self.records_skipped += outcome.skipped() as u64;
    }
}

/// Ingests a results file into a [`CrunchStore`], resuming after the caller's checkpoint.
///
/// Runs sequentially on the current task: lines are read one at a time and at most one batch is
/// being written at any moment.
#[derive(Debug)]
pub struct SyncPipeline<S> {
    config: SyncPipelineConfig,
    store: S,
}

impl<S> SyncPipeline<S>
where
    S: CrunchStore,
{
    pub fn new(config: SyncPipelineConfig, store: S) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &SyncPipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the sync until the source file is exhausted.
    ///
    /// Checkpoint lookup failures, uniqueness conflicts and failed batches are handled inside the
    /// run. Errors reading the source file and rewards that are not integers stop the run and
    /// are returned, records still buffered at that point are not written.
    pub async fn run(&self) -> SyncResult<SyncSummary> {
        let caller = self.config.caller.as_str();
        let path = &self.config.source_path;

        let checkpoint = resolve_checkpoint(&self.store, caller).await;
        info!(caller, start_line = checkpoint, "starting from line number {checkpoint}");

        let file = File::open(path).await.map_err(|err| {
            sync_error!(
                ErrorKind::IoError,
                "Failed to open the source file",
                path.display(),
                source: err
            )
        })?;
        let mut lines = BufReader::new(file).lines();

        let mut committer = BatchCommitter::new(&self.store, caller, self.config.batch_max_size);
        let mut summary = SyncSummary {
            checkpoint,
            ..SyncSummary::default()
        };

        let mut line_number: LineNumber = 0;
        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            summary.lines_read += 1;

            if line_number <= checkpoint {
                summary.lines_skipped += 1;
                continue;
            }

            let Some(record) = parse_line(&line, line_number)? else {
                counter!(CRUNCH_MALFORMED_LINES_TOTAL, CALLER_LABEL => caller.to_owned())
                    .increment(1);
                summary.malformed_lines += 1;
                continue;
            };

            if let Some(outcome) = committer.push(record).await {
                summary.record_outcome(&outcome);
            }
        }
        summary.last_line_number = line_number;

        if let Some(outcome) = committer.flush().await {
            summary.record_outcome(&outcome);
        }

        if summary.lines_skipped < checkpoint {
            debug!(
                caller,
                checkpoint,
                last_line_number = line_number,
                "source file is shorter than the checkpoint"
            );
        }

        info!(
            caller,
            last_line_number = summary.last_line_number,
            inserted = summary.records_inserted,
            skipped = summary.records_skipped,
            malformed = summary.malformed_lines,
            batches_committed = summary.batches_committed,
            batches_abandoned = summary.batches_abandoned,
            "source file exhausted"
        );

        Ok(summary)
    }
}
