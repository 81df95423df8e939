use crunch_config::load_config;
use crunch_config::shared::SyncerConfig;

use crate::error::{SyncerError, SyncerResult};

/// Loads and validates the syncer configuration.
pub fn load_syncer_config() -> SyncerResult<SyncerConfig> {
    let config = load_config::<SyncerConfig>().map_err(SyncerError::config)?;
    config.validate().map_err(SyncerError::config)?;

    Ok(config)
}
