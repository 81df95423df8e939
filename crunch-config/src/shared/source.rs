use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of the append-only results file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Path of the file to ingest, relative paths resolve against the working directory.
    #[serde(default = "default_source_path")]
    pub path: PathBuf,
}

impl SourceConfig {
    pub const DEFAULT_PATH: &'static str = "efficient_addresses.txt";
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: default_source_path(),
        }
    }
}

fn default_source_path() -> PathBuf {
    PathBuf::from(SourceConfig::DEFAULT_PATH)
}
