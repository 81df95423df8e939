use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::store::{BatchWriteReport, CrunchStore};
use crate::types::{CrunchRecord, LineNumber};

/// Operations of a [`FaultInjectingStore`] that should fail.
#[derive(Debug, Clone, Default)]
pub struct FaultConfig {
    /// Fail every checkpoint lookup.
    pub fail_last_line_number: bool,
    /// Zero based indices of the `write_batch` calls that fail.
    pub fail_batches: HashSet<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    batch_attempts: usize,
    failed_batches: Vec<usize>,
}

/// Wraps a [`CrunchStore`] and fails the operations selected in [`FaultConfig`].
///
/// Failing calls never reach the wrapped store, so a failed batch leaves no record behind.
#[derive(Debug, Clone)]
pub struct FaultInjectingStore<S> {
    inner: S,
    config: FaultConfig,
    state: Arc<Mutex<Inner>>,
}

impl<S> FaultInjectingStore<S> {
    pub fn wrap(inner: S, config: FaultConfig) -> Self {
        Self {
            inner,
            config,
            state: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn get_inner(&self) -> &S {
        &self.inner
    }

    /// Number of `write_batch` calls received, failed ones included.
    pub async fn batch_attempts(&self) -> usize {
        self.state.lock().await.batch_attempts
    }

    /// Indices of the `write_batch` calls that were failed.
    pub async fn failed_batches(&self) -> Vec<usize> {
        self.state.lock().await.failed_batches.clone()
    }
}

impl<S> CrunchStore for FaultInjectingStore<S>
where
    S: CrunchStore + Send + Sync,
{
    async fn last_line_number(&self, caller: &str) -> SyncResult<Option<LineNumber>> {
        if self.config.fail_last_line_number {
            bail!(
                ErrorKind::ConnectionFailed,
                "Database connection failed",
                "injected checkpoint failure"
            );
        }

        self.inner.last_line_number(caller).await
    }

    async fn write_batch(
        &self,
        caller: &str,
        records: &[CrunchRecord],
    ) -> SyncResult<BatchWriteReport> {
        {
            let mut state = self.state.lock().await;
            let attempt = state.batch_attempts;
            state.batch_attempts += 1;

            if self.config.fail_batches.contains(&attempt) {
                state.failed_batches.push(attempt);
                bail!(
                    ErrorKind::QueryFailed,
                    "Database operation failed",
                    format!("injected failure of batch {attempt}")
                );
            }
        }

        self.inner.write_batch(caller, records).await
    }
}
