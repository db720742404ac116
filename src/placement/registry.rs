use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::{
    error::PlacementError,
    host::AssetHandle,
    types::{GameCircle, GeoCoordinate},
};

use super::{Category, ModelTransform};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    /// Scenery ids come from the rounded coordinate, so the same spot always
    /// yields the same id for a category.
    pub fn for_scenery(category: Category, coord: GeoCoordinate, precision: usize) -> Self {
        EntityId(format!(
            "{}-{:.*}-{:.*}",
            category.slug(),
            precision,
            coord.long(),
            precision,
            coord.lat()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Unregistered,
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct PlacedEntity {
    id: EntityId,
    category: Category,
    coordinate: GeoCoordinate,
    transform: ModelTransform,
    asset: Option<AssetHandle>,
    render_state: RenderState,
    placed_at: DateTime<Utc>,
}

impl PlacedEntity {
    pub fn new(
        id: EntityId,
        category: Category,
        coordinate: GeoCoordinate,
        transform: ModelTransform,
    ) -> Self {
        Self {
            id,
            category,
            coordinate,
            transform,
            asset: None,
            render_state: RenderState::Unregistered,
            placed_at: Utc::now(),
        }
    }

    pub fn with_asset(mut self, asset: AssetHandle) -> Self {
        self.asset = Some(asset);
        self
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn coordinate(&self) -> GeoCoordinate {
        self.coordinate
    }

    pub fn transform(&self) -> &ModelTransform {
        &self.transform
    }

    pub fn asset(&self) -> Option<AssetHandle> {
        self.asset
    }

    pub fn render_state(&self) -> RenderState {
        self.render_state
    }

    pub fn placed_at(&self) -> DateTime<Utc> {
        self.placed_at
    }
}

#[derive(Debug, Clone, PartialEq)]
struct IndexedEntity {
    id: EntityId,
    // [long, lat]
    point: [f64; 2],
}

impl IndexedEntity {
    fn of(entity: &PlacedEntity) -> Self {
        IndexedEntity {
            id: entity.id.clone(),
            point: [entity.coordinate.long(), entity.coordinate.lat()],
        }
    }
}

impl RTreeObject for IndexedEntity {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

/// Owns every live entity on the map.
///
/// Only the registry moves an entity between render states. All mutation goes
/// through `&mut self`, so a reader holding `&self` sees either the state before
/// a call or the state after it.
pub struct EntityRegistry {
    entities: Vec<PlacedEntity>,
    index: RTree<IndexedEntity>,
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            entities: Vec::new(),
            index: RTree::new(),
        }
    }

    pub fn add(&mut self, mut entity: PlacedEntity) -> Result<EntityId, PlacementError> {
        if entity.render_state != RenderState::Unregistered {
            return Err(PlacementError::DuplicateId(entity.id));
        }
        if entity.category == Category::Player {
            if let Some(existing) = self.entities.iter().find(|e| e.category == Category::Player) {
                return Err(PlacementError::DuplicateId(existing.id.clone()));
            }
        }

        entity.render_state = RenderState::Added;
        self.index.insert(IndexedEntity::of(&entity));
        let id = entity.id.clone();
        self.entities.push(entity);
        Ok(id)
    }

    /// Swaps out every entity of the new entity's category for it in one step.
    pub fn replace(
        &mut self,
        entity: PlacedEntity,
    ) -> Result<(EntityId, Vec<PlacedEntity>), PlacementError> {
        if entity.render_state != RenderState::Unregistered {
            return Err(PlacementError::DuplicateId(entity.id));
        }
        let removed = self.remove_all(entity.category);
        let id = self.add(entity)?;
        Ok((id, removed))
    }

    /// Removes the most recently added entity with this id.
    pub fn remove(&mut self, id: &EntityId) -> Option<PlacedEntity> {
        let position = self.entities.iter().rposition(|e| &e.id == id)?;
        let entity = self.entities.remove(position);
        Some(self.retire(entity))
    }

    /// Removes every entity of a category. Calling it with nothing to remove is fine.
    pub fn remove_all(&mut self, category: Category) -> Vec<PlacedEntity> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entities)
            .into_iter()
            .partition(|e| e.category == category);
        self.entities = kept;
        removed.into_iter().map(|e| self.retire(e)).collect()
    }

    pub fn remove_everything(&mut self) -> Vec<PlacedEntity> {
        self.index = RTree::new();
        std::mem::take(&mut self.entities)
            .into_iter()
            .map(|mut e| {
                e.render_state = RenderState::Removed;
                e
            })
            .collect()
    }

    fn retire(&mut self, mut entity: PlacedEntity) -> PlacedEntity {
        self.index.remove(&IndexedEntity::of(&entity));
        entity.render_state = RenderState::Removed;
        entity
    }

    pub fn list(&self, category: Option<Category>) -> Vec<&PlacedEntity> {
        self.entities
            .iter()
            .filter(|e| category.is_none_or(|c| e.category == c))
            .collect()
    }

    pub fn get(&self, id: &EntityId) -> Option<&PlacedEntity> {
        self.entities.iter().find(|e| &e.id == id)
    }

    pub fn player(&self) -> Option<&PlacedEntity> {
        self.entities.iter().find(|e| e.category == Category::Player)
    }

    /// Entities whose coordinate lies inside the circle.
    pub fn within(&self, circle: &GameCircle) -> Vec<&PlacedEntity> {
        let (lat_span, long_span) = circle.envelope_degrees();
        let center = circle.center;
        let min = [center.long() - long_span, center.lat() - lat_span];
        let max = [center.long() + long_span, center.lat() + lat_span];

        // Boxes that wrap the antimeridian fall back to checking everything.
        let candidates: Option<HashSet<&EntityId>> = if min[0] < -180.0 || max[0] > 180.0 {
            None
        } else {
            Some(
                self.index
                    .locate_in_envelope_intersecting(&AABB::from_corners(min, max))
                    .map(|indexed| &indexed.id)
                    .collect(),
            )
        };

        self.entities
            .iter()
            .filter(|e| candidates.as_ref().is_none_or(|ids| ids.contains(&e.id)))
            .filter(|e| circle.contains(e.coordinate))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::{Orientation, PolicyTable, build_static_transform};
    use crate::types::{DistanceUnit, project};

    fn entity(category: Category, lat: f64, long: f64) -> PlacedEntity {
        let coord = GeoCoordinate::new(lat, long);
        let table = PolicyTable::default();
        let projected = project(coord).unwrap();
        let transform = build_static_transform(projected, table.get(category), Orientation::Fixed);
        let id = match category {
            Category::Player => EntityId::new("player"),
            _ => EntityId::for_scenery(category, coord, 6),
        };
        PlacedEntity::new(id, category, coord, transform)
    }

    #[test]
    fn scenery_ids_round_the_coordinate() {
        let id = EntityId::for_scenery(Category::Pine, GeoCoordinate::new(21.7, -97.9), 6);
        assert_eq!(id.as_str(), "pine--97.900000-21.700000");
        let same = EntityId::for_scenery(Category::Pine, GeoCoordinate::new(21.7000001, -97.9), 6);
        assert_eq!(id, same);
        let birch = EntityId::for_scenery(Category::Birch, GeoCoordinate::new(21.7, -97.9), 6);
        assert_ne!(id, birch);
    }

    #[test]
    fn add_marks_entities_added() {
        let mut registry = EntityRegistry::new();
        let id = registry.add(entity(Category::Pine, 21.7, -97.9)).unwrap();
        assert_eq!(registry.get(&id).unwrap().render_state(), RenderState::Added);
    }

    #[test]
    fn replacement_player_carries_a_fresh_timestamp() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Player, 1.0, 1.0)).unwrap();
        let first = registry.player().unwrap().placed_at();
        let (_, removed) = registry.replace(entity(Category::Player, 2.0, 2.0)).unwrap();
        assert_eq!(removed[0].placed_at(), first);
        assert!(registry.player().unwrap().placed_at() >= first);
    }

    #[test]
    fn second_player_is_a_duplicate() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Player, 1.0, 1.0)).unwrap();
        let err = registry.add(entity(Category::Player, 2.0, 2.0)).unwrap_err();
        assert_eq!(err, PlacementError::DuplicateId(EntityId::new("player")));
        assert_eq!(registry.list(Some(Category::Player)).len(), 1);
    }

    #[test]
    fn replace_keeps_exactly_one_player() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Player, 1.0, 1.0)).unwrap();
        let (_, removed) = registry.replace(entity(Category::Player, 2.0, 2.0)).unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].render_state(), RenderState::Removed);

        let players = registry.list(Some(Category::Player));
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].coordinate(), GeoCoordinate::new(2.0, 2.0));
    }

    #[test]
    fn removed_entities_cannot_come_back() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Daisy, 3.0, 3.0)).unwrap();
        let removed = registry.remove_all(Category::Daisy).pop().unwrap();
        assert!(matches!(registry.add(removed), Err(PlacementError::DuplicateId(_))));
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_all_is_idempotent_and_scoped() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Pine, 21.7, -97.9)).unwrap();
        registry.add(entity(Category::Birch, 21.8, -97.9)).unwrap();

        assert_eq!(registry.remove_all(Category::Pine).len(), 1);
        assert!(registry.remove_all(Category::Pine).is_empty());
        assert!(registry.list(Some(Category::Pine)).is_empty());
        assert_eq!(registry.list(None).len(), 1);

        assert_eq!(registry.remove_everything().len(), 1);
        assert!(registry.remove_everything().is_empty());
    }

    #[test]
    fn scenery_is_not_deduplicated() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Pine, 21.7, -97.9)).unwrap();
        registry.add(entity(Category::Pine, 21.7, -97.9)).unwrap();
        assert_eq!(registry.list(Some(Category::Pine)).len(), 2);
    }

    #[test]
    fn within_uses_true_distance() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Pine, 21.7388, -97.9333)).unwrap();
        registry.add(entity(Category::Birch, 21.7420, -97.9330)).unwrap();
        registry.add(entity(Category::Daisy, 21.9000, -97.9333)).unwrap();

        let center = GeoCoordinate::new(21.738836, -97.933290);
        let circle = GameCircle::new(center, 1.0, DistanceUnit::Kilometers);
        let inside: Vec<Category> = registry.within(&circle).iter().map(|e| e.category()).collect();
        assert_eq!(inside, vec![Category::Pine, Category::Birch]);

        registry.remove_all(Category::Pine);
        assert_eq!(registry.within(&circle).len(), 1);
    }

    #[test]
    fn within_across_the_antimeridian() {
        let mut registry = EntityRegistry::new();
        registry.add(entity(Category::Pine, 0.0, -179.999)).unwrap();
        let circle = GameCircle::new(GeoCoordinate::new(0.0, 179.999), 1.0, DistanceUnit::Miles);
        assert_eq!(registry.within(&circle).len(), 1);
    }
}
