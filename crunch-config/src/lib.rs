//! Configuration types and loading for the crunch syncer.
//!
//! Configuration is read from `configuration/base.*` and `configuration/{environment}.*`
//! files and then overridden by `APP_`-prefixed environment variables.

mod environment;
mod load;
pub mod shared;

pub use environment::Environment;
pub use load::{LoadConfigError, load_config, load_config_from_directory};
