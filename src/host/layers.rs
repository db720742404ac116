use serde::{Deserialize, Serialize};

use crate::{error::PlacementError, placement::LightRig};

use super::MapHost;

pub const CUSTOM_LAYER_TYPE: &str = "custom";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleLayer {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: String,
}

/// A 3D custom layer carrying one placed model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDescriptor {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: String,
    pub rendering_mode: String,
    pub asset: String,
    pub light_rig: LightRig,
}

impl LayerDescriptor {
    pub fn custom_3d(id: &str, asset: &str, light_rig: LightRig) -> Self {
        Self {
            id: id.to_string(),
            layer_type: CUSTOM_LAYER_TYPE.to_string(),
            rendering_mode: "3d".to_string(),
            asset: asset.to_string(),
            light_rig,
        }
    }
}

/// New models go underneath the first custom layer already on the map.
pub fn insertion_point(layers: &[StyleLayer]) -> Option<String> {
    layers
        .iter()
        .find(|layer| layer.layer_type == CUSTOM_LAYER_TYPE)
        .map(|layer| layer.id.clone())
}

/// An in-memory layer stack with the same rules as the map style:
/// ids are unique and `before_id` must exist.
#[derive(Debug, Default, Clone)]
pub struct StyleLayers {
    layers: Vec<StyleLayer>,
    descriptors: Vec<LayerDescriptor>,
    repaint_requested: bool,
}

impl StyleLayers {
    pub fn new(base: Vec<StyleLayer>) -> Self {
        Self {
            layers: base,
            ..Default::default()
        }
    }

    pub fn descriptor(&self, id: &str) -> Option<&LayerDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id.as_str()).collect()
    }

    /// Returns whether a repaint was asked for since the last call.
    pub fn take_repaint(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }
}

impl MapHost for StyleLayers {
    fn add_layer(
        &mut self,
        layer: LayerDescriptor,
        before_id: Option<&str>,
    ) -> Result<(), PlacementError> {
        if self.layers.iter().any(|l| l.id == layer.id) {
            return Err(PlacementError::LayerRegistrationFailure {
                id: layer.id,
                reason: "a layer with this id already exists".to_string(),
            });
        }
        let position = match before_id {
            Some(before) => self.layers.iter().position(|l| l.id == before).ok_or_else(|| {
                PlacementError::LayerRegistrationFailure {
                    id: layer.id.clone(),
                    reason: format!("layer {before} does not exist"),
                }
            })?,
            None => self.layers.len(),
        };

        self.layers.insert(
            position,
            StyleLayer {
                id: layer.id.clone(),
                layer_type: layer.layer_type.clone(),
            },
        );
        self.descriptors.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), PlacementError> {
        let position = self.layers.iter().position(|l| l.id == id).ok_or_else(|| {
            PlacementError::LayerRegistrationFailure {
                id: id.to_string(),
                reason: "no such layer".to_string(),
            }
        })?;
        self.layers.remove(position);
        self.descriptors.retain(|d| d.id != id);
        Ok(())
    }

    fn style_layers(&self) -> Vec<StyleLayer> {
        self.layers.clone()
    }

    fn trigger_repaint(&mut self) {
        self.repaint_requested = true;
    }
}
