use blockytry_camera::EyepointSettings;
use blockytry_input::KeyBindings;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Everything tunable about the simulation. Every field has a default, so a
/// config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub camera: EyepointSettings,
    pub bindings: KeyBindings,
    /// Point registered at startup as the lock-on candidate.
    pub lock_target: Option<Vec3>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            camera: EyepointSettings::default(),
            bindings: KeyBindings::default(),
            lock_target: Some(Vec3::ZERO),
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded simulation config");
        Ok(config)
    }
}
