//! # Configuration Loader / 配置加载器
//!
//! Reads the TOML file and maps it onto [`PairingConfig`]. Defaults for
//! missing sections live on the DTO itself; nothing is validated here.

use std::path::PathBuf;

use anyhow::Context;
use gp_core::PairingConfig;

/// Load configuration from a TOML file
/// 从 TOML 文件加载配置
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or is not valid TOML for
/// [`PairingConfig`].
pub fn load_config(config_path: PathBuf) -> anyhow::Result<PairingConfig> {
    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let config: PairingConfig =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    Ok(config)
}

/// Like [`load_config`], but no path means the built-in defaults.
pub fn load_config_or_default(config_path: Option<PathBuf>) -> anyhow::Result<PairingConfig> {
    match config_path {
        Some(path) => load_config(path),
        None => Ok(PairingConfig::default()),
    }
}
