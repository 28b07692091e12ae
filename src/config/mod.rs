//! Configuration module for jobhound
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// Load settings from the first configuration file found, falling back to
/// built-in defaults. The environment is merged in last.
pub fn load() -> Result<Settings> {
    // Explicit path wins
    if let Ok(path) = std::env::var("JOBHOUND_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    let paths = [
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/jobhound/settings.yml"),
        dirs::config_dir()
            .map(|p| p.join("jobhound/settings.yml"))
            .unwrap_or_default(),
    ];

    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}
