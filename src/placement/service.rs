use bevy::{
    log::{debug, info, warn},
    math::DMat4,
};
use rand::{RngCore, SeedableRng, rngs::StdRng};

use crate::{
    error::PlacementError,
    host::{AssetSource, AssetState, LayerDescriptor, MapHost, insertion_point},
    settings::PlacementSettings,
    types::{GeoCoordinate, project},
};

use super::{
    Category, EntityId, EntityRegistry, Orientation, PlacedEntity, YawPolicy,
    build_static_transform, compose_frame,
};

/// Result of placing a batch of scenery. One bad coordinate never stops the rest.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchPlacement {
    pub placed: Vec<EntityId>,
    /// Index into the requested coordinates, with what went wrong there.
    pub failures: Vec<(usize, PlacementError)>,
}

/// What the renderer should do with one entity this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Draw(DMat4),
    /// The model is still on its way; draw nothing yet.
    Loading,
    /// The model failed to load or was released.
    Skipped,
    /// No live entity has this id.
    Missing,
}

/// Ties projection, transforms and the registry to the map host and asset loader.
pub struct PlacementService<H: MapHost, A: AssetSource> {
    registry: EntityRegistry,
    host: H,
    assets: A,
    settings: PlacementSettings,
    rng: StdRng,
}

impl<H: MapHost, A: AssetSource> PlacementService<H, A> {
    pub fn new(host: H, assets: A, settings: PlacementSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            registry: EntityRegistry::new(),
            host,
            assets,
            settings,
            rng,
        }
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn assets(&self) -> &A {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut A {
        &mut self.assets
    }

    pub fn settings(&self) -> &PlacementSettings {
        &self.settings
    }

    /// Moves the player to `coord`, replacing whatever player was on the map.
    pub fn place_player(&mut self, coord: GeoCoordinate) -> Result<EntityId, PlacementError> {
        let id = EntityId::new(self.settings.player_layer_id.as_str());
        let entity = self.prepare(Category::Player, id, coord)?;
        let (id, removed) = self.registry.replace(entity)?;
        self.retire(removed);
        self.attach_layer(&id)?;
        info!("Placed player at {:?}", coord.to_tuple());
        Ok(id)
    }

    /// Places one scenery entity per coordinate. Player requests go through
    /// `place_player` one by one so there is still only ever one player.
    pub fn place_scenery(
        &mut self,
        category: Category,
        coords: &[GeoCoordinate],
    ) -> BatchPlacement {
        let mut batch = BatchPlacement::default();
        for (index, coord) in coords.iter().copied().enumerate() {
            let placed = if category.is_scenery() {
                self.place_one(category, coord)
            } else {
                self.place_player(coord)
            };
            match placed {
                Ok(id) => batch.placed.push(id),
                Err(err) => {
                    warn!("Skipping {category} #{index}: {err}");
                    batch.failures.push((index, err));
                }
            }
        }
        info!(
            "Placed {} {category} entities, {} failed",
            batch.placed.len(),
            batch.failures.len()
        );
        batch
    }

    fn place_one(
        &mut self,
        category: Category,
        coord: GeoCoordinate,
    ) -> Result<EntityId, PlacementError> {
        let id = EntityId::for_scenery(category, coord, self.settings.id_precision);
        let entity = self.prepare(category, id, coord)?;
        let id = self.registry.add(entity)?;
        self.attach_layer(&id)?;
        Ok(id)
    }

    fn prepare(
        &mut self,
        category: Category,
        id: EntityId,
        coord: GeoCoordinate,
    ) -> Result<PlacedEntity, PlacementError> {
        let point = project(coord)?;
        let policy = self.settings.policies.get(category);
        let orientation = match policy.yaw {
            YawPolicy::Random => Orientation::Seeded(self.rng.next_u64()),
            YawPolicy::Fixed => Orientation::Fixed,
        };
        let transform = build_static_transform(point, policy, orientation);
        let asset = self.assets.load(&policy.asset);
        Ok(PlacedEntity::new(id, category, coord, transform).with_asset(asset))
    }

    fn attach_layer(&mut self, id: &EntityId) -> Result<(), PlacementError> {
        let Some(entity) = self.registry.get(id) else {
            return Err(PlacementError::LayerRegistrationFailure {
                id: id.to_string(),
                reason: "entity vanished before its layer was added".to_string(),
            });
        };
        let policy = self.settings.policies.get(entity.category());
        let descriptor =
            LayerDescriptor::custom_3d(id.as_str(), &policy.asset, policy.light_rig.clone());
        let before = insertion_point(&self.host.style_layers());

        if let Err(err) = self.host.add_layer(descriptor, before.as_deref()) {
            warn!("{err}");
            if let Some(rejected) = self.registry.remove(id) {
                if let Some(asset) = rejected.asset() {
                    self.assets.release(asset);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn retire(&mut self, removed: Vec<PlacedEntity>) {
        for entity in removed {
            if let Err(err) = self.host.remove_layer(entity.id().as_str()) {
                warn!("{err}");
            }
            if let Some(asset) = entity.asset() {
                self.assets.release(asset);
            }
            debug!("Removed {} (placed {})", entity.id(), entity.placed_at());
        }
    }

    /// Tears down one category, or everything when `category` is `None`.
    pub fn clear(&mut self, category: Option<Category>) -> usize {
        let removed = match category {
            Some(category) => self.registry.remove_all(category),
            None => self.registry.remove_everything(),
        };
        let count = removed.len();
        self.retire(removed);
        count
    }

    /// The per-frame callback for one entity. The camera matrix is the map's
    /// current view projection.
    pub fn render(&self, id: &EntityId, camera: DMat4) -> FrameOutcome {
        let Some(entity) = self.registry.get(id) else {
            return FrameOutcome::Missing;
        };
        let ready = match entity.asset() {
            Some(asset) => self.assets.state(asset),
            None => AssetState::Ready,
        };
        match ready {
            AssetState::Ready => {
                // Latitude -90 projects to an infinite y.
                let matrix = compose_frame(entity.transform(), camera);
                if matrix.is_finite() {
                    FrameOutcome::Draw(matrix)
                } else {
                    warn!("{} has a non-finite frame matrix, skipping draw", entity.id());
                    FrameOutcome::Skipped
                }
            }
            AssetState::Loading => FrameOutcome::Loading,
            AssetState::Failed(_) | AssetState::Unknown => FrameOutcome::Skipped,
        }
    }

    /// Renders every live entity and asks the map for another frame while
    /// anything is on screen or still loading.
    pub fn render_frame(&mut self, camera: DMat4) -> Vec<(EntityId, DMat4)> {
        let mut drawn = Vec::new();
        let mut loading = 0;
        for entity in self.registry.list(None) {
            match self.render(entity.id(), camera) {
                FrameOutcome::Draw(matrix) => drawn.push((entity.id().clone(), matrix)),
                FrameOutcome::Loading => loading += 1,
                FrameOutcome::Skipped | FrameOutcome::Missing => {}
            }
        }
        if !drawn.is_empty() || loading > 0 {
            self.host.trigger_repaint();
        }
        drawn
    }
}
