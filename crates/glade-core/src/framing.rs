//! Camera auto-framing from scene bounding volumes
//!
//! The framer reduces a set of mesh volumes to one overall box and places
//! the camera on the -Z side of its center, far enough back to see the
//! whole box. It is a pure function: the caller applies the result to a
//! live camera.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bounds::BoundingVolume;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FramingError {
    #[error("Invalid framing input: no finite bounding volumes")]
    InvalidInput,
}

/// Distance tuning for the framer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingParams {
    /// Multiplier applied to the bounding radius
    #[serde(default = "default_distance_factor")]
    pub distance_factor: f32,
    /// Lower bound on camera distance, in world units
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
}

fn default_distance_factor() -> f32 {
    1.5
}

fn default_min_distance() -> f32 {
    5.0
}

impl Default for FramingParams {
    fn default() -> Self {
        Self {
            distance_factor: default_distance_factor(),
            min_distance: default_min_distance(),
        }
    }
}

/// Camera pose produced by the framer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameResult {
    pub position: Vec3,
    pub target: Vec3,
    /// Distance between position and target
    pub distance: f32,
}

impl FrameResult {
    /// Pose used when there is nothing to frame
    pub const FALLBACK: FrameResult = FrameResult {
        position: Vec3::new(0.0, 10.0, -10.0),
        target: Vec3::ZERO,
        distance: 14.142136,
    };
}

/// Frame the given volumes with the default parameters
pub fn frame<'a, I>(volumes: I) -> Result<FrameResult, FramingError>
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    frame_with(volumes, &FramingParams::default())
}

/// Frame the given volumes with explicit parameters
///
/// Volumes with non-finite corners are skipped. Fails with
/// [`FramingError::InvalidInput`] when no finite volume remains.
pub fn frame_with<'a, I>(volumes: I, params: &FramingParams) -> Result<FrameResult, FramingError>
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    let overall = volumes
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<BoundingVolume>, v| {
            Some(match acc {
                Some(total) => total.union(v),
                None => *v,
            })
        })
        .ok_or(FramingError::InvalidInput)?;

    let center = overall.center();
    let distance = (overall.radius() * params.distance_factor).max(params.min_distance);

    Ok(FrameResult {
        position: center - Vec3::new(0.0, 0.0, distance),
        target: center,
        distance,
    })
}

/// Frame the volumes, or return [`FrameResult::FALLBACK`] on invalid input
pub fn frame_or_fallback<'a, I>(volumes: I, params: &FramingParams) -> FrameResult
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    match frame_with(volumes, params) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Camera auto-framing failed ({}), using fallback pose", e);
            FrameResult::FALLBACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vol(min: [f32; 3], max: [f32; 3]) -> BoundingVolume {
        BoundingVolume::new(Vec3::from(min), Vec3::from(max))
    }

    #[test]
    fn test_single_volume() {
        let volumes = [vol([0.0, 0.0, 0.0], [2.0, 2.0, 2.0])];
        let result = frame(&volumes).unwrap();
        assert_eq!(result.target, Vec3::ONE);
        assert_eq!(result.distance, 5.0);
        assert_eq!(result.position, Vec3::new(1.0, 1.0, -4.0));
    }

    #[test]
    fn test_two_volumes_union() {
        let volumes = [
            vol([-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]),
            vol([3.0, 3.0, 3.0], [5.0, 5.0, 5.0]),
        ];
        let result = frame(&volumes).unwrap();
        assert_eq!(result.target, Vec3::splat(2.0));

        // Half extent (3,3,3) -> radius 3*sqrt(3) ~ 5.196 -> distance ~ 7.794
        let expected = 3.0 * 3f32.sqrt() * 1.5;
        assert!((result.distance - expected).abs() < 1e-5);
        assert!((result.position.z - (2.0 - expected)).abs() < 1e-5);
    }

    #[test]
    fn test_empty_is_invalid_input() {
        let volumes: [BoundingVolume; 0] = [];
        assert_eq!(frame(&volumes), Err(FramingError::InvalidInput));
    }

    #[test]
    fn test_fallback_pose() {
        let volumes: Vec<BoundingVolume> = Vec::new();
        let result = frame_or_fallback(&volumes, &FramingParams::default());
        assert_eq!(result.position, Vec3::new(0.0, 10.0, -10.0));
        assert_eq!(result.target, Vec3::ZERO);
    }

    #[test]
    fn test_distance_floor() {
        // Radius just under 5 / 1.5
        let h = 3.3 / 3f32.sqrt();
        let volumes = [vol([-h, -h, -h], [h, h, h])];
        let result = frame(&volumes).unwrap();
        assert_eq!(result.distance, 5.0);

        let tiny = [vol([0.5, 0.5, 0.5], [0.5, 0.5, 0.5])];
        let result = frame(&tiny).unwrap();
        assert_eq!(result.distance, 5.0);
        assert_eq!(result.position, Vec3::new(0.5, 0.5, -4.5));
    }

    #[test]
    fn test_idempotent() {
        let volumes = [
            vol([-1.3, 0.2, 7.0], [4.1, 2.9, 9.5]),
            vol([0.0, -6.0, 1.0], [0.1, 0.0, 1.5]),
        ];
        let a = frame(&volumes).unwrap();
        let b = frame(&volumes).unwrap();
        assert_eq!(a.position.to_array().map(f32::to_bits), b.position.to_array().map(f32::to_bits));
        assert_eq!(a.target.to_array().map(f32::to_bits), b.target.to_array().map(f32::to_bits));
    }

    #[test]
    fn test_order_independent() {
        let a = vol([-1.3, 0.2, 7.0], [4.1, 2.9, 9.5]);
        let b = vol([0.0, -6.0, 1.0], [0.1, 0.0, 1.5]);
        let c = vol([10.0, 10.0, 10.0], [12.0, 11.0, 13.0]);
        let forward = frame(&[a, b, c]).unwrap();
        let reversed = frame(&[c, b, a]).unwrap();
        let shuffled = frame(&[b, c, a]).unwrap();
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_non_finite_volumes_skipped() {
        let volumes = [
            vol([f32::NAN, 0.0, 0.0], [1.0, 1.0, 1.0]),
            vol([0.0, 0.0, 0.0], [2.0, 2.0, 2.0]),
        ];
        let result = frame(&volumes).unwrap();
        assert_eq!(result.target, Vec3::ONE);

        let only_bad = [vol([f32::INFINITY; 3], [f32::NEG_INFINITY; 3])];
        assert_eq!(frame(&only_bad), Err(FramingError::InvalidInput));
    }

    #[test]
    fn test_custom_params() {
        let params = FramingParams {
            distance_factor: 2.0,
            min_distance: 1.0,
        };
        let volumes = [vol([0.0, 0.0, 0.0], [2.0, 0.0, 0.0])];
        let result = frame_with(&volumes, &params).unwrap();
        assert_eq!(result.distance, 2.0);
        assert_eq!(result.position, Vec3::new(1.0, 0.0, -2.0));
    }
}
