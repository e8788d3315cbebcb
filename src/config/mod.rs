use self::strategy::GridConfiguration;
use crate::error::BotError;
use anyhow::{Context, Result};
use std::env;
use std::fs;

pub mod broadcast;
pub mod creator;
pub mod exchange;
pub mod strategy;

#[cfg(test)]
mod test_secrets;

pub fn load_config(path: &str) -> Result<GridConfiguration, BotError> {
    let content = fs::read_to_string(path)?;
    let config: GridConfiguration = toml::from_str(&content)?;
    config
        .validate()
        .map_err(|e| BotError::ValidationError(e.to_string()))?;
    log::info!(
        "Loaded {} config for {} ({} slots)",
        config.mode_name(),
        config.symbol,
        config.slot_count
    );
    Ok(config)
}

/// Reads `NAME` from the environment, or the contents of the file named by `NAME_FILE`.
pub fn read_env_or_file(name: &str) -> Result<String> {
    if let Ok(value) = env::var(name) {
        return Ok(value);
    }

    let file_var = format!("{}_FILE", name);
    let path = env::var(&file_var).with_context(|| format!("{} is not set", name))?;
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {} at {}", file_var, path))?;
    Ok(content.trim().to_string())
}
