//! Places a player avatar and scenery models on a Mercator map and keeps them
//! projected every frame, plus the great-circle distance used by game state.

pub mod error;
pub mod host;
pub mod placement;
pub mod settings;
pub mod types;

pub use error::{PlacementError, SettingsError};
pub use placement::{
    BatchPlacement, Category, EntityId, EntityRegistry, PlacementPlugin, PlacementService,
};
pub use types::{DistanceUnit, GameCircle, GeoCoordinate, distance, project};
