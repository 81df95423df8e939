use serde::Deserialize;

use crate::shared::{BatchConfig, PgConnectionConfig, PoolConfig, SourceConfig, ValidationError};

/// Settings of a single sync run.
///
/// This intentionally does not implement [`Serialize`](serde::Serialize) because it holds
/// the database password.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Caller identity scoping both the resume checkpoint and the uniqueness of addresses.
    pub caller: String,
    /// The results file to ingest.
    #[serde(default)]
    pub source: SourceConfig,
    /// Batch processing configuration.
    #[serde(default)]
    pub batch: BatchConfig,
    /// Connection pool bounds.
    #[serde(default)]
    pub pool: PoolConfig,
    /// The Postgres instance holding the `crunch` table.
    pub pg_connection: PgConnectionConfig,
}

impl SyncConfig {
    /// Validates every nested section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.caller.trim().is_empty() {
            return Err(ValidationError::EmptyCaller);
        }

        self.pg_connection.tls.validate()?;
        self.batch.validate()?;
        self.pool.validate()
    }
}

/// Complete configuration for the syncer binary.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncerConfig {
    pub sync: SyncConfig,
}

impl SyncerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.sync.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::TlsConfig;

    fn sync_config(caller: &str) -> SyncConfig {
        SyncConfig {
            caller: caller.to_string(),
            source: SourceConfig::default(),
            batch: BatchConfig::default(),
            pool: PoolConfig::default(),
            pg_connection: PgConnectionConfig {
                host: "localhost".to_string(),
                port: 5432,
                name: "crunch".to_string(),
                username: "postgres".to_string(),
                password: None,
                tls: TlsConfig::disabled(),
            },
        }
    }

    #[test]
    fn blank_caller_is_rejected() {
        assert!(matches!(
            sync_config("  ").validate(),
            Err(ValidationError::EmptyCaller)
        ));
        assert!(sync_config("0xcafe").validate().is_ok());
    }

    #[test]
    fn nested_sections_are_validated() {
        let mut config = sync_config("0xcafe");
        config.batch.max_size = 0;

        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidFieldValue { .. })
        ));
    }
}
