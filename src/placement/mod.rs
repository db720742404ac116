//! # Placement Module
//!
//! Puts georeferenced models on the map and keeps them projected as the camera moves.
//!
//! ## Sub-modules
//! - `policy`: per-category asset, scale, lighting and orientation rules
//! - `transform`: static model transforms and the per-frame matrix
//! - `registry`: the live entities and their render states
//! - `service`: placement requests from game state, end to end
//!
//! The plugin wires the service into a Bevy app: game state sends
//! [`PlacePlayer`], [`PlaceScenery`] and [`ClearCategory`] events, the map
//! writes the [`CameraMatrix`] each frame and reads back [`FrameMatrices`].

mod policy;
mod registry;
mod service;
mod transform;

pub use policy::*;
pub use registry::*;
pub use service::*;
pub use transform::*;

use bevy::{math::DMat4, prelude::*};

use crate::{
    error::PlacementError,
    host::{AssetLoaderLink, AssetTracker, StyleLayer, StyleLayers},
    settings::PlacementSettings,
    types::GeoCoordinate,
};

#[derive(Default)]
pub struct PlacementPlugin {
    pub settings: PlacementSettings,
    /// Layers already on the map style when the app starts.
    pub base_layers: Vec<StyleLayer>,
}

impl Plugin for PlacementPlugin {
    fn build(&self, app: &mut App) {
        let (tracker, link) = AssetTracker::new();
        let host = StyleLayers::new(self.base_layers.clone());
        app.insert_resource(Placement(PlacementService::new(
            host,
            tracker,
            self.settings.clone(),
        )))
        .insert_resource(AssetLoaderChannel(link))
        .init_resource::<CameraMatrix>()
        .init_resource::<FrameMatrices>()
        .add_event::<PlacePlayer>()
        .add_event::<PlaceScenery>()
        .add_event::<ClearCategory>()
        .add_event::<PlacementReport>()
        .add_systems(
            Update,
            (
                poll_asset_completions,
                handle_clear_category,
                handle_place_player,
                handle_place_scenery,
                render_placed_entities,
            )
                .chain(),
        );
    }
}

#[derive(Resource)]
pub struct Placement(pub PlacementService<StyleLayers, AssetTracker>);

/// Where the asset loader picks up requests and reports completions.
#[derive(Resource, Clone)]
pub struct AssetLoaderChannel(pub AssetLoaderLink);

/// The map's view projection for the current frame, column-major.
#[derive(Resource, Debug, Clone, Copy)]
pub struct CameraMatrix(pub DMat4);

impl Default for CameraMatrix {
    fn default() -> Self {
        CameraMatrix(DMat4::IDENTITY)
    }
}

impl CameraMatrix {
    pub fn from_array(matrix: &[f64; 16]) -> Self {
        CameraMatrix(camera_from_array(matrix))
    }
}

/// Matrices for every entity that can be drawn this frame.
#[derive(Resource, Debug, Default, Clone)]
pub struct FrameMatrices(pub Vec<(EntityId, DMat4)>);

impl FrameMatrices {
    pub fn get(&self, id: &EntityId) -> Option<DMat4> {
        self.0.iter().find(|(e, _)| e == id).map(|(_, m)| *m)
    }
}

#[derive(Event, Debug, Clone)]
pub struct PlacePlayer {
    pub coord: GeoCoordinate,
}

#[derive(Event, Debug, Clone)]
pub struct PlaceScenery {
    pub category: Category,
    pub coords: Vec<GeoCoordinate>,
}

/// `None` clears every category.
#[derive(Event, Debug, Clone)]
pub struct ClearCategory {
    pub category: Option<Category>,
}

#[derive(Event, Debug, Clone)]
pub enum PlacementReport {
    Player(Result<EntityId, PlacementError>),
    Scenery {
        category: Category,
        batch: BatchPlacement,
    },
    Cleared {
        category: Option<Category>,
        count: usize,
    },
}

fn poll_asset_completions(mut placement: ResMut<Placement>) {
    placement.0.assets_mut().poll_completions();
}

fn handle_clear_category(
    mut requests: EventReader<ClearCategory>,
    mut placement: ResMut<Placement>,
    mut reports: EventWriter<PlacementReport>,
) {
    for request in requests.read() {
        let count = placement.0.clear(request.category);
        reports.write(PlacementReport::Cleared {
            category: request.category,
            count,
        });
    }
}

fn handle_place_player(
    mut requests: EventReader<PlacePlayer>,
    mut placement: ResMut<Placement>,
    mut reports: EventWriter<PlacementReport>,
) {
    for request in requests.read() {
        let result = placement.0.place_player(request.coord);
        if let Err(err) = &result {
            warn!("Player placement failed: {err}");
        }
        reports.write(PlacementReport::Player(result));
    }
}

fn handle_place_scenery(
    mut requests: EventReader<PlaceScenery>,
    mut placement: ResMut<Placement>,
    mut reports: EventWriter<PlacementReport>,
) {
    for request in requests.read() {
        let batch = placement.0.place_scenery(request.category, &request.coords);
        reports.write(PlacementReport::Scenery {
            category: request.category,
            batch,
        });
    }
}

fn render_placed_entities(
    camera: Res<CameraMatrix>,
    mut placement: ResMut<Placement>,
    mut frame: ResMut<FrameMatrices>,
) {
    frame.0 = placement.0.render_frame(camera.0);
}
