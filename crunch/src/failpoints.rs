use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// Fires after every record of a batch was written and before the transaction commits.
pub const WRITE_BATCH_BEFORE_COMMIT: &str = "write_batch.before_commit";

pub fn crunch_fail_point(name: &str) -> SyncResult<()> {
    fail_point!(name, |parameter| {
        let error_kind = match parameter.as_deref() {
            Some("connection") => ErrorKind::ConnectionFailed,
            Some("query") => ErrorKind::QueryFailed,
            _ => ErrorKind::FailpointError,
        };

        bail!(
            error_kind,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
