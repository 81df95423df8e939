use tracing::error;

use crate::store::CrunchStore;
use crate::types::LineNumber;

/// Resolves the line number the sync resumes after.
///
/// Returns the highest line number stored for `caller`, or 0 when the caller has no rows yet. A
/// failed lookup is logged and also resolves to 0: reprocessing from the first line is safe since
/// already stored addresses are skipped when written again.
pub async fn resolve_checkpoint<S>(store: &S, caller: &str) -> LineNumber
where
    S: CrunchStore,
{
    match store.last_line_number(caller).await {
        Ok(line_number) => line_number.unwrap_or(0),
        Err(err) => {
            error!(caller, error = %err, "failed to read the checkpoint, starting from the first line");
            0
        }
    }
}
