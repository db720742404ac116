use std::path::{Path, PathBuf};

use bevy::log::{info, warn};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{error::SettingsError, placement::PolicyTable};

pub const SETTINGS_FILE: &str = "placement.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    pub policies: PolicyTable,
    /// The player keeps this id across relocations.
    pub player_layer_id: String,
    /// Decimal places kept when building scenery ids from coordinates.
    pub id_precision: usize,
    /// Fixes the scenery yaw sequence. Fresh entropy when unset.
    pub seed: Option<u64>,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            policies: PolicyTable::default(),
            player_layer_id: "player".to_string(),
            id_precision: 6,
            seed: None,
        }
    }
}

impl PlacementSettings {
    pub fn default_path() -> Result<PathBuf, SettingsError> {
        ProjectDirs::from("", "", "battle-locale")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
            .ok_or(SettingsError::NoConfigDir)
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.policies.validate()?;
        info!("Loaded placement settings from {:?}", path);
        Ok(settings)
    }

    /// Reads the settings file if there is one. Anything unreadable falls back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No placement settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("{e}. Using default placement settings.");
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        self.policies.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, json).map_err(io_err)?;
        info!("Saved placement settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = PlacementSettings {
            seed: Some(11),
            id_precision: 4,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(PlacementSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn partial_files_fill_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "player_layer_id": "3d-model" }"#).unwrap();
        let settings = PlacementSettings::load_from(&path).unwrap();
        assert_eq!(settings.player_layer_id, "3d-model");
        assert_eq!(settings.policies, PolicyTable::default());
        assert_eq!(settings.id_precision, 6);
    }

    #[test]
    fn invalid_policy_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        let mut settings = PlacementSettings::default();
        settings.policies.pine.base_scale = -1.0;
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

        assert!(matches!(
            PlacementSettings::load_from(&path),
            Err(SettingsError::InvalidPolicy { .. })
        ));
        assert_eq!(PlacementSettings::load_or_default(&path), PlacementSettings::default());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PlacementSettings::load_or_default(&dir.path().join("nope.json"));
        assert_eq!(settings, PlacementSettings::default());
    }
}
