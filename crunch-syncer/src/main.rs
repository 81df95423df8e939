//! Crunch syncer binary.
//!
//! Loads the configuration, initializes tracing and ingests the configured results file into
//! Postgres once, resuming after the last line already stored for the caller.

use std::process::ExitCode;

use crunch_config::shared::SyncerConfig;
use crunch_telemetry::tracing::init_tracing;
use tracing::error;

use crate::config::load_syncer_config;
use crate::core::start_syncer_with_config;
use crate::error::{SyncerError, SyncerResult};

mod config;
mod core;
mod error;
mod migrations;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run() -> SyncerResult<()> {
    let syncer_config = load_syncer_config()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME")).map_err(SyncerError::config)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(syncer_config))?;

    Ok(())
}

async fn async_main(syncer_config: SyncerConfig) -> SyncerResult<()> {
    if let Err(err) = start_syncer_with_config(syncer_config).await {
        error!("{err}");
        return Err(err);
    }

    Ok(())
}
