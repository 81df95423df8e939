use crunch_postgres::crunch::{
    NewCrunchRow, get_max_line_number, insert_crunch_row, is_unique_violation,
};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{ErrorKind, SyncError, SyncResult};
#[cfg(feature = "failpoints")]
use crate::failpoints::{WRITE_BATCH_BEFORE_COMMIT, crunch_fail_point};
use crate::store::base::{BatchWriteReport, CrunchStore};
use crate::sync_error;
use crate::types::{CrunchRecord, LineNumber};

/// Savepoint wrapping the insert of a single record.
const RECORD_SAVEPOINT: &str = "crunch_record";

/// A [`CrunchStore`] backed by the `crunch` table.
///
/// Uses the injected pool for every unit of work: the checkpoint lookup holds one connection for
/// the duration of the query and every batch runs in its own transaction. Connections are handed
/// back to the pool when the guard is dropped, on success and on failure alike.
#[derive(Debug, Clone)]
pub struct PostgresCrunchStore {
    pool: PgPool,
}

impl PostgresCrunchStore {
    /// Creates a store writing through `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the pool used by this store.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl CrunchStore for PostgresCrunchStore {
    async fn last_line_number(&self, caller: &str) -> SyncResult<Option<LineNumber>> {
        let mut connection = self.pool.acquire().await?;
        let line_number = get_max_line_number(&mut connection, caller).await?;

        line_number
            .map(|line_number| {
                LineNumber::try_from(line_number).map_err(|err| {
                    sync_error!(
                        ErrorKind::InvalidData,
                        "Stored line number is negative",
                        format!("caller `{caller}` has line number {line_number}"),
                        source: err
                    )
                })
            })
            .transpose()
    }

    async fn write_batch(
        &self,
        caller: &str,
        records: &[CrunchRecord],
    ) -> SyncResult<BatchWriteReport> {
        // Dropping the transaction before the commit rolls the whole batch back.
        let mut transaction = self.pool.begin().await?;

        let mut report = BatchWriteReport::default();
        for record in records {
            let row = new_crunch_row(caller, record)?;

            sqlx::query(&format!("savepoint {RECORD_SAVEPOINT}"))
                .execute(&mut *transaction)
                .await?;

            match insert_crunch_row(&mut transaction, &row).await {
                Ok(()) => {
                    sqlx::query(&format!("release savepoint {RECORD_SAVEPOINT}"))
                        .execute(&mut *transaction)
                        .await?;
                    report.inserted += 1;
                }
                Err(err) if is_unique_violation(&err) => {
                    sqlx::query(&format!("rollback to savepoint {RECORD_SAVEPOINT}"))
                        .execute(&mut *transaction)
                        .await?;
                    debug!(
                        caller,
                        line_number = record.line_number,
                        address = %record.address,
                        "address already stored, skipping record"
                    );
                    report.conflicts.push(record.line_number);
                }
                Err(err) => return Err(err.into()),
            }
        }

        #[cfg(feature = "failpoints")]
        crunch_fail_point(WRITE_BATCH_BEFORE_COMMIT)?;

        transaction.commit().await?;

        Ok(report)
    }
}

/// Converts a record into the column values of the `crunch` table.
fn new_crunch_row<'a>(caller: &'a str, record: &'a CrunchRecord) -> SyncResult<NewCrunchRow<'a>> {
    Ok(NewCrunchRow {
        caller_address: caller,
        salt: &record.salt,
        address: &record.address,
        reward: &record.reward,
        total_zeroes: to_integer_column(record.total_zeroes, record.line_number)?,
        leading_zeroes: to_integer_column(record.leading_zeroes, record.line_number)?,
        line_number: i64::try_from(record.line_number).map_err(|err| {
            sync_error!(
                ErrorKind::ConversionError,
                "Line number does not fit a bigint column",
                record.line_number,
                source: err
            )
        })?,
    })
}

fn to_integer_column(count: u32, line_number: LineNumber) -> Result<i32, SyncError> {
    i32::try_from(count).map_err(|err| {
        sync_error!(
            ErrorKind::ConversionError,
            "Zero count does not fit an integer column",
            format!("line {line_number}: {count}"),
            source: err
        )
    })
}
