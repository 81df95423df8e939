use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use crunch::error::SyncError;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

/// Result type for syncer operations.
pub type SyncerResult<T> = Result<T, SyncerError>;

/// Captured backtrace wrapper for the variants that do not carry one.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for the syncer binary.
///
/// Wraps [`SyncError`] for failures of the sync itself and adds variants for the process setup.
#[derive(Debug)]
pub enum SyncerError {
    /// Failure of the sync run or of the connection to the database.
    Sync(SyncError),
    /// Configuration or tracing setup error.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// Database migration error.
    Migration(sqlx::Error, CapturedBacktrace),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
}

impl SyncerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            SyncerError::Sync(_) => "sync error",
            SyncerError::Config(_, _) => "configuration error",
            SyncerError::Migration(_, _) => "migration error",
            SyncerError::Io(_, _) => "i/o error",
        }
    }

    pub fn backtrace(&self) -> &Backtrace {
        match self {
            SyncerError::Sync(err) => err.backtrace(),
            SyncerError::Config(_, cb) | SyncerError::Migration(_, cb) | SyncerError::Io(_, cb) => {
                &cb.0
            }
        }
    }

    /// Creates a configuration error from any source.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        SyncerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("crunch syncer failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {self}\n"));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace() {
            let backtrace = self.backtrace().to_string();
            if !backtrace.trim().is_empty() {
                out.push_str("backtrace:\n");
                out.push_str(&backtrace);
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }

        out
    }
}

impl fmt::Display for SyncerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncerError::Sync(err) => {
                write!(f, "[{:?}] {}", err.kind(), err.description())?;
                if let Some(detail) = err.detail() {
                    write!(f, ": {detail}")?;
                }

                Ok(())
            }
            SyncerError::Config(source, _) => write!(f, "configuration error: {source}"),
            SyncerError::Migration(source, _) => write!(f, "migration error: {source}"),
            SyncerError::Io(source, _) => write!(f, "i/o error: {source}"),
        }
    }
}

impl Error for SyncerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SyncerError::Sync(err) => err.source(),
            SyncerError::Config(source, _) => Some(source.as_ref()),
            SyncerError::Migration(source, _) => Some(source),
            SyncerError::Io(source, _) => Some(source),
        }
    }
}

impl From<sqlx::Error> for SyncerError {
    fn from(err: sqlx::Error) -> Self {
        SyncerError::Migration(err, CapturedBacktrace::capture())
    }
}

impl From<std::io::Error> for SyncerError {
    fn from(err: std::io::Error) -> Self {
        SyncerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<SyncError> for SyncerError {
    fn from(err: SyncError) -> Self {
        SyncerError::Sync(err)
    }
}
