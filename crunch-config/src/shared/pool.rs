use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Bounds of the Postgres connection pool.
///
/// The pipeline is sequential and holds at most one connection at a time, the upper bound
/// leaves room for tooling sharing the same pool.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PoolConfig {
    /// Connections kept open for the lifetime of the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Upper bound of simultaneously open connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl PoolConfig {
    pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;

    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

    /// Validates that the pool can hold at least one connection and that the bounds are ordered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_connections == 0 {
            return Err(ValidationError::InvalidFieldValue {
                field: "sync.pool.max_connections".to_string(),
                constraint: "must be greater than 0".to_string(),
            });
        }

        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidFieldValue {
                field: "sync.pool.min_connections".to_string(),
                constraint: format!(
                    "must not exceed `sync.pool.max_connections` ({})",
                    self.max_connections
                ),
            });
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_min_connections() -> u32 {
    PoolConfig::DEFAULT_MIN_CONNECTIONS
}

fn default_max_connections() -> u32 {
    PoolConfig::DEFAULT_MAX_CONNECTIONS
}
