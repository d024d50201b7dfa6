mod schema;
mod validation;

pub use schema::{ExcludeConfig, Settings, DEFAULT_JOBS};
pub use validation::validate_settings;

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the settings directory path (~/.config/srk-fix/)
pub fn get_config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("srk-fix"))
}

/// Get the default settings file path (~/.config/srk-fix/config.yaml)
pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.yaml"))
}

/// Load settings from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to a settings file. If None, uses the default path
///   (~/.config/srk-fix/config.yaml), and falls back to default settings when
///   that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given settings file does not exist
/// - The settings file cannot be read
/// - The YAML cannot be parsed
pub fn load_settings(path: Option<PathBuf>) -> Result<Settings> {
    let (settings_path, explicit) = match path {
        Some(p) => (p, true),
        None => (get_config_path()?, false),
    };

    if !settings_path.exists() {
        if explicit {
            anyhow::bail!("Settings file not found at {}", settings_path.display());
        }
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&settings_path)
        .with_context(|| format!("Failed to read settings file at {}", settings_path.display()))?;

    let settings: Settings = serde_saphyr::from_str(&content).with_context(|| {
        format!("Failed to parse settings: invalid YAML in {}", settings_path.display())
    })?;

    Ok(settings)
}
