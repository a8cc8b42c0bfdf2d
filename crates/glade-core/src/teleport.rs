//! Teleport target selection against floor volumes

use glam::Vec3;

use crate::bounds::BoundingVolume;

/// Intersect a pointer ray with the top face of a floor volume.
///
/// Returns the hit point when the ray travels towards the face and lands
/// inside the floor's X/Z extent.
pub fn ray_floor_hit(origin: Vec3, direction: Vec3, floor: &BoundingVolume) -> Option<Vec3> {
    if direction.y.abs() < f32::EPSILON {
        return None;
    }

    let t = (floor.max.y - origin.y) / direction.y;
    if t < 0.0 {
        return None;
    }

    let hit = origin + direction * t;
    let inside = hit.x >= floor.min.x
        && hit.x <= floor.max.x
        && hit.z >= floor.min.z
        && hit.z <= floor.max.z;

    inside.then_some(hit)
}

/// Nearest hit over several floors
pub fn nearest_floor_hit<'a, I>(origin: Vec3, direction: Vec3, floors: I) -> Option<Vec3>
where
    I: IntoIterator<Item = &'a BoundingVolume>,
{
    floors
        .into_iter()
        .filter_map(|floor| ray_floor_hit(origin, direction, floor))
        .min_by(|a, b| {
            a.distance_squared(origin)
                .total_cmp(&b.distance_squared(origin))
        })
}

/// Ray parameter where the ray enters `volume` (slab test).
///
/// `None` when the ray misses, or when it starts inside the volume.
pub fn ray_volume_entry(origin: Vec3, direction: Vec3, volume: &BoundingVolume) -> Option<f32> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;

    for axis in 0..3 {
        let (o, d) = (origin[axis], direction[axis]);
        let (lo, hi) = (volume.min[axis], volume.max[axis]);
        if d.abs() < f32::EPSILON {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (t1, t2) = ((lo - o) / d, (hi - o) / d);
        t_enter = t_enter.max(t1.min(t2));
        t_exit = t_exit.min(t1.max(t2));
    }

    (t_enter <= t_exit && t_enter >= 0.0).then_some(t_enter)
}

/// Nearest floor hit, unless one of `obstacles` is entered first
pub fn unobstructed_floor_hit<'a, F, O>(
    origin: Vec3,
    direction: Vec3,
    floors: F,
    obstacles: O,
) -> Option<Vec3>
where
    F: IntoIterator<Item = &'a BoundingVolume>,
    O: IntoIterator<Item = &'a BoundingVolume>,
{
    let hit = nearest_floor_hit(origin, direction, floors)?;
    let floor_t = (hit - origin).dot(direction) / direction.length_squared();

    let blocked = obstacles
        .into_iter()
        .filter_map(|volume| ray_volume_entry(origin, direction, volume))
        .any(|t| t < floor_t);

    (!blocked).then_some(hit)
}

/// Camera position after teleporting onto `hit`
pub fn destination(hit: Vec3, eye_height: f32) -> Vec3 {
    hit + Vec3::Y * eye_height
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor() -> BoundingVolume {
        BoundingVolume::new(Vec3::new(-10.0, -0.1, -10.0), Vec3::new(10.0, 0.0, 10.0))
    }

    #[test]
    fn test_hit_from_above() {
        let hit = ray_floor_hit(Vec3::new(0.0, 1.6, -5.0), Vec3::new(0.0, -1.0, 1.0).normalize(), &floor());
        let hit = hit.unwrap();
        assert!(hit.y.abs() < 1e-6);
        assert!((hit.z - (-3.4)).abs() < 1e-4);
    }

    #[test]
    fn test_miss_outside_extent() {
        let origin = Vec3::new(0.0, 1.0, 0.0);
        let dir = Vec3::new(1.0, -0.01, 0.0).normalize();
        assert_eq!(ray_floor_hit(origin, dir, &floor()), None);
    }

    #[test]
    fn test_miss_pointing_up_or_parallel() {
        let origin = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(ray_floor_hit(origin, Vec3::Y, &floor()), None);
        assert_eq!(ray_floor_hit(origin, Vec3::X, &floor()), None);
    }

    #[test]
    fn test_nearest_of_two_floors() {
        let lower = floor();
        let upper = BoundingVolume::new(Vec3::new(-1.0, 0.5, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let hit = nearest_floor_hit(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, [&lower, &upper]).unwrap();
        assert_eq!(hit, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_volume_entry() {
        let cube = BoundingVolume::new(Vec3::ZERO, Vec3::splat(2.0));
        let t = ray_volume_entry(Vec3::new(1.0, 1.0, -4.0), Vec3::Z, &cube).unwrap();
        assert!((t - 4.0).abs() < 1e-6);

        // Behind the origin
        assert_eq!(ray_volume_entry(Vec3::new(1.0, 1.0, -4.0), Vec3::NEG_Z, &cube), None);
        // Passes beside it
        assert_eq!(ray_volume_entry(Vec3::new(5.0, 1.0, -4.0), Vec3::Z, &cube), None);
        // Starts inside
        assert_eq!(ray_volume_entry(Vec3::ONE, Vec3::Z, &cube), None);
    }

    #[test]
    fn test_model_in_front_of_floor_blocks_teleport() {
        let origin = Vec3::new(0.0, 1.6, -5.0);
        let dir = Vec3::new(0.0, -1.0, 1.0).normalize();
        let house = BoundingVolume::new(Vec3::new(-1.0, 0.0, -4.0), Vec3::new(1.0, 2.0, -3.0));

        assert_eq!(unobstructed_floor_hit(origin, dir, [&floor()], [&house]), None);
    }

    #[test]
    fn test_model_behind_floor_hit_does_not_block() {
        let origin = Vec3::new(0.0, 1.6, -5.0);
        let dir = Vec3::new(0.0, -1.0, 1.0).normalize();
        let house = BoundingVolume::new(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(1.0, 2.0, 4.0));

        let hit = unobstructed_floor_hit(origin, dir, [&floor()], [&house]).unwrap();
        assert!((hit.z - (-3.4)).abs() < 1e-4);
    }

    #[test]
    fn test_destination_adds_eye_height() {
        assert_eq!(destination(Vec3::new(2.0, 0.0, 3.0), 1.6), Vec3::new(2.0, 1.6, 3.0));
    }
}
