//! World-space axis-aligned bounding volumes

use glam::{Affine3A, Vec3};

/// Axis-aligned box in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingVolume {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Build a volume from a local center/half-extent box and a world transform.
    ///
    /// All eight corners are transformed and re-bounded, so rotated meshes
    /// get a box that still contains every transformed vertex.
    pub fn from_local(center: Vec3, half_extents: Vec3, transform: &Affine3A) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..8 {
            let sign = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            let corner = transform.transform_point3(center + half_extents * sign);
            min = min.min(corner);
            max = max.max(corner);
        }

        Self { min, max }
    }

    /// Coordinate-wise union of two volumes
    pub fn union(&self, other: &BoundingVolume) -> BoundingVolume {
        BoundingVolume {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Euclidean length of the half-extent
    pub fn radius(&self) -> f32 {
        self.half_extent().length()
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}
