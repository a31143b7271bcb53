use crate::config::error::ConfigError;
use crate::config::ValidatorConfig;
use std::fs;
use std::path::Path;

/// Reads the service configuration.
///
/// `None` yields the defaults. A path that does not exist is an error rather
/// than a silent fallback, so a typo in `--config-path` is noticed.
pub fn read_config(path: Option<&Path>) -> Result<ValidatorConfig, ConfigError> {
    let config = match path {
        None => ValidatorConfig::default(),
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::incorrect_path(path));
            }
            tracing::info!("loading validator config from {}", path.display());
            let file = fs::File::open(path)?;
            let raw: Option<ValidatorConfig> = serde_yaml::from_reader(file)?;
            raw.unwrap_or_default()
        }
    };

    config.validate()?;
    Ok(config)
}
