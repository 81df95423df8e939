//! Shared configuration types for the crunch syncer.

mod base;
mod batch;
mod connection;
mod pool;
mod source;
mod sync;

pub use base::ValidationError;
pub use batch::BatchConfig;
pub use connection::{
    CRUNCH_SYNC_OPTIONS, IntoConnectOptions, PgConnectionConfig, PgConnectionOptions, TlsConfig,
};
pub use pool::PoolConfig;
pub use source::SourceConfig;
pub use sync::{SyncConfig, SyncerConfig};
