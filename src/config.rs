// Run configuration and its between-run persistence. The saved file lives in
// the user's home directory and holds base URL, username and folder name as
// JSON. The password is never written to disk; it is re-entered every run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Everything one export run needs to talk to the device and place output.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Normalized base URL, no trailing slash.
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub folder_name: String,
}

/// The subset of `RunConfig` that persists between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedConfig {
    pub base_url: String,
    pub username: String,
    pub folder_name: String,
}

impl RunConfig {
    /// The persistable part of this configuration (everything but the
    /// password).
    pub fn saved(&self) -> SavedConfig {
        SavedConfig {
            base_url: self.base_url.clone(),
            username: self.username.clone(),
            folder_name: self.folder_name.clone(),
        }
    }
}

fn config_path() -> PathBuf {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.join(".acsexport_config.json")
}

/// Load the previous run's configuration, if a readable one exists. Any
/// problem (missing file, bad JSON) just means there is nothing to offer.
pub fn load_saved() -> Option<SavedConfig> {
    let data = std::fs::read_to_string(config_path()).ok()?;
    serde_json::from_str(&data).ok()
}

/// Persist the reusable part of the configuration. Called only after a run
/// completes successfully.
pub fn save(config: &SavedConfig) -> Result<()> {
    let path = config_path();
    let json = serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
