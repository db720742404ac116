//! # Host Interfaces
//!
//! The map and the asset loader live outside this crate. This module describes
//! what placement needs from them and ships in-memory versions that the Bevy
//! plugin drives.
//!
//! ## Sub-modules
//! - `layers`: the map's layer stack and the descriptors handed to it
//! - `assets`: asynchronous model loading tracked by handle

mod assets;
mod layers;

pub use assets::*;
pub use layers::*;

use crate::error::PlacementError;

pub trait MapHost {
    fn add_layer(
        &mut self,
        layer: LayerDescriptor,
        before_id: Option<&str>,
    ) -> Result<(), PlacementError>;

    fn remove_layer(&mut self, id: &str) -> Result<(), PlacementError>;

    fn style_layers(&self) -> Vec<StyleLayer>;

    fn trigger_repaint(&mut self);
}

pub trait AssetSource {
    /// Starts loading a model. The returned handle is pending until the loader reports back.
    fn load(&mut self, path: &str) -> AssetHandle;

    fn state(&self, handle: AssetHandle) -> AssetState;

    /// Forgets a handle. A load that finishes afterwards is dropped.
    fn release(&mut self, handle: AssetHandle);
}
