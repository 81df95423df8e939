use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::Environment;

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// File stem of the configuration shared by every environment.
const BASE_FILE_STEM: &str = "base";

const FILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Variables named `APP_<SECTION>__<KEY>` override file values, e.g. `APP_SYNC__CALLER`.
const ENV_PREFIX: &str = "APP";
const ENV_PREFIX_SEPARATOR: &str = "_";
const ENV_SEPARATOR: &str = "__";

/// Errors raised while assembling the configuration.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("failed to determine runtime environment: {0}")]
    Environment(#[source] io::Error),

    #[error("configuration directory `{0}` does not exist")]
    MissingConfigurationDirectory(PathBuf),

    #[error("no `{stem}.yaml`, `{stem}.yml` or `{stem}.json` in `{directory}`")]
    ConfigurationFileMissing { stem: String, directory: PathBuf },

    #[error("failed to read configuration: {0}")]
    Build(#[source] rust_cli_config::ConfigError),

    #[error("failed to deserialize configuration: {0}")]
    Deserialization(#[source] rust_cli_config::ConfigError),
}

/// Loads `T` from `./configuration` for the environment named by `APP_ENVIRONMENT`.
///
/// Values from `base.*` are overridden by `{environment}.*`, which are overridden by `APP_`
/// environment variables using `__` between nested keys.
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    let directory = std::env::current_dir()
        .map_err(LoadConfigError::CurrentDir)?
        .join(CONFIGURATION_DIR);
    let environment = Environment::load().map_err(LoadConfigError::Environment)?;

    load_config_from_directory(&directory, environment)
}

/// Same as [`load_config`] with an explicit directory and environment.
pub fn load_config_from_directory<T>(
    directory: &Path,
    environment: Environment,
) -> Result<T, LoadConfigError>
where
    T: DeserializeOwned,
{
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingConfigurationDirectory(
            directory.to_path_buf(),
        ));
    }

    let base_file = find_file(directory, BASE_FILE_STEM)?;
    let environment_file = find_file(directory, environment.as_str())?;

    let overrides = rust_cli_config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_PREFIX_SEPARATOR)
        .separator(ENV_SEPARATOR);

    rust_cli_config::Config::builder()
        .add_source(rust_cli_config::File::from(base_file))
        .add_source(rust_cli_config::File::from(environment_file))
        .add_source(overrides)
        .build()
        .map_err(LoadConfigError::Build)?
        .try_deserialize()
        .map_err(LoadConfigError::Deserialization)
}

/// Returns the first `{stem}.{extension}` file present in `directory`.
fn find_file(directory: &Path, stem: &str) -> Result<PathBuf, LoadConfigError> {
    FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadConfigError::ConfigurationFileMissing {
            stem: stem.to_owned(),
            directory: directory.to_path_buf(),
        })
}
