//! Command handlers and the helpers they share.

pub mod accessories;
pub mod config_cmd;
pub mod run;

use std::path::PathBuf;

use lumenkeep_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// The config file this invocation reads: `--config`, else the platform path.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(lumenkeep_config::config_path)
}

/// Load and validate the effective configuration.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_file(global);
    tracing::debug!(path = %path.display(), "loading config");
    let config = match &global.config {
        Some(path) => lumenkeep_config::load_config_from(path)?,
        None => lumenkeep_config::load_config()?,
    };
    Ok(config)
}

/// The accessory state file: `--registry`, else the configured path.
pub fn registry_file(global: &GlobalOpts, config: &Config) -> PathBuf {
    global
        .registry
        .clone()
        .unwrap_or_else(|| config.registry_path())
}
