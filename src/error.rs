use std::path::PathBuf;

use crate::placement::EntityId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    #[error("coordinate ({lat}, {long}) is outside the valid latitude/longitude range")]
    InvalidCoordinate { lat: f64, long: f64 },

    #[error("an entity with id {0} is already placed")]
    DuplicateId(EntityId),

    #[error("asset {path} failed to load: {reason}")]
    AssetLoadFailure { path: String, reason: String },

    #[error("map rejected layer {id}: {reason}")]
    LayerRegistrationFailure { id: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("policy for {category} is invalid: {reason}")]
    InvalidPolicy { category: String, reason: String },

    #[error("no configuration directory is available on this platform")]
    NoConfigDir,
}
