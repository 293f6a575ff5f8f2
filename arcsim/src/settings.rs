use crate::journal::JournalSettings;
use anyhow::{Context, Result};
use arcsim_core::SimConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of the `--settings` file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub simulation: SimConfig,
    pub journal: JournalSettings,
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings {}", path.display()))?;
        settings
            .simulation
            .validate()
            .with_context(|| format!("Invalid simulation settings in {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}
