//! Markers: named transforms exchanged with dungeon builders and theming.

use bevy::math::{Quat, Vec3};
use bevy::transform::components::Transform;
use serde::{Deserialize, Serialize};

/// Per-component tolerance used when comparing marker locations.
pub const LOCATION_TOLERANCE: f32 = 1e-4;

/// A named point in space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerInfo {
    pub id: i32,
    pub marker_name: String,
    pub transform: Transform,
}

impl MarkerInfo {
    pub fn new(id: i32, marker_name: impl Into<String>, transform: Transform) -> Self {
        Self {
            id,
            marker_name: marker_name.into(),
            transform,
        }
    }

    /// A marker with identity rotation and unit scale.
    pub fn at(id: i32, marker_name: impl Into<String>, location: Vec3) -> Self {
        Self::new(id, marker_name, Transform::from_translation(location))
    }

    pub fn location(&self) -> Vec3 {
        self.transform.translation
    }

    /// Same name at the same location (within [`LOCATION_TOLERANCE`]).
    pub fn is_same_marker(&self, other: &MarkerInfo) -> bool {
        self.marker_name == other.marker_name && locations_equal(self.location(), other.location())
    }
}

pub fn locations_equal(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() <= LOCATION_TOLERANCE
}

/// Re-express every marker under `transform`, applied after the marker's own transform.
pub fn transform_markers(markers: &mut [MarkerInfo], transform: &Transform) {
    for marker in markers.iter_mut() {
        marker.transform = transform.mul_transform(marker.transform);
    }
}

/// Inverse of a translate/rotate/scale transform.
///
/// Zero scale components invert to zero instead of infinity. Exact for
/// uniform scale.
pub fn inverse_transform(transform: &Transform) -> Transform {
    let inv_scale = safe_reciprocal(transform.scale);
    let inv_rotation: Quat = transform.rotation.inverse();
    let inv_translation = inv_rotation * (inv_scale * -transform.translation);
    Transform {
        translation: inv_translation,
        rotation: inv_rotation,
        scale: inv_scale,
    }
}

fn safe_reciprocal(v: Vec3) -> Vec3 {
    let recip = |x: f32| if x.abs() <= f32::EPSILON { 0.0 } else { 1.0 / x };
    Vec3::new(recip(v.x), recip(v.y), recip(v.z))
}
