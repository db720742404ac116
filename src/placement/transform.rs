use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, TAU};

use bevy::math::{DMat4, DVec3};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::types::ProjectedPoint;

use super::{CategoryPolicy, YawPolicy};

/// Tilt that stands glTF models upright on the map's ground plane.
pub const BASE_ROTATION: DVec3 = DVec3::new(FRAC_PI_2, -FRAC_PI_4 + 0.1, 0.0);

/// Whether a placement may draw a random yaw, and from which seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Fixed,
    Seeded(u64),
}

/// Everything needed to put one model on the map, fixed at placement time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub translate: DVec3,
    /// Applied about X, then Y, then Z.
    pub rotate: DVec3,
    pub scale: f64,
    /// Model-local yaw about the model's up axis.
    pub yaw: f64,
    /// Model-local offset, applied before the yaw.
    pub offset: DVec3,
}

impl ModelTransform {
    /// The part of the frame matrix that never changes for this entity.
    fn model_matrix(&self) -> DMat4 {
        let translation = DMat4::from_translation(self.translate);
        let scale = DMat4::from_scale(DVec3::new(self.scale, -self.scale, self.scale));
        let rotation_x = DMat4::from_rotation_x(self.rotate.x);
        let rotation_y = DMat4::from_rotation_y(self.rotate.y);
        let rotation_z = DMat4::from_rotation_z(self.rotate.z);
        let local = DMat4::from_translation(self.offset) * DMat4::from_rotation_y(self.yaw);

        translation * scale * rotation_x * rotation_y * rotation_z * local
    }
}

pub fn build_static_transform(
    point: ProjectedPoint,
    policy: &CategoryPolicy,
    orientation: Orientation,
) -> ModelTransform {
    let yaw = match (policy.yaw, orientation) {
        (YawPolicy::Random, Orientation::Seeded(seed)) => {
            StdRng::seed_from_u64(seed).gen_range(0.0..TAU)
        }
        _ => 0.0,
    };

    ModelTransform {
        translate: DVec3::new(point.x, point.y, point.z),
        rotate: BASE_ROTATION,
        scale: point.scale_factor * policy.base_scale,
        yaw,
        offset: DVec3::from_array(policy.offset),
    }
}

/// Builds the projection matrix for one frame. The camera changes every
/// frame, so nothing here is cached.
pub fn compose_frame(transform: &ModelTransform, camera: DMat4) -> DMat4 {
    camera * transform.model_matrix()
}

/// Reads a 16 element column-major camera matrix as handed over by the map.
pub fn camera_from_array(matrix: &[f64; 16]) -> DMat4 {
    DMat4::from_cols_array(matrix)
}
