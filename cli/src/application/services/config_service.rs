//! Application service: configuration use-cases.

use anyhow::Result;

use crate::application::ports::ConfigStore;
use crate::domain::config::RoutectlConfig;

/// Load configuration.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config(store: &impl ConfigStore) -> Result<RoutectlConfig> {
    store.load()
}

/// Validate and store one setting, returning the updated configuration.
///
/// # Errors
///
/// Returns an error if the key or value is invalid, or the file cannot be written.
pub fn set_value(store: &impl ConfigStore, key: &str, value: &str) -> Result<RoutectlConfig> {
    let mut config = store.load()?;
    config.apply(key, value)?;
    store.save(&config)?;
    Ok(config)
}
