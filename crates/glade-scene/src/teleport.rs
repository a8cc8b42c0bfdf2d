//! Teleporting the camera onto the floor

use bevy::prelude::*;
use glade_core::teleport::{destination, unobstructed_floor_hit};
use glade_core::BoundingVolume;

use crate::camera::MainCamera;
use crate::framing::{collect_framed_volumes, mesh_world_volume, RoleQuery};
use crate::types::ViewerSettings;

/// Pointer travel in pixels beyond which a press is a drag, not a tap
const TAP_SLOP: f32 = 5.0;

/// Marker for entities that accept teleports
#[derive(Component)]
pub struct TeleportFloor;

/// Teleportation state shared by the desktop pointer and the XR session
#[derive(Resource, Debug, Clone, Default)]
pub struct Teleportation {
    pub enabled: bool,
    /// Floor entities the user can teleport onto
    pub floors: Vec<Entity>,
}

impl Teleportation {
    /// Register a floor mesh; registering the same entity twice is a no-op
    pub fn add_floor_mesh(&mut self, entity: Entity) {
        if !self.floors.contains(&entity) {
            self.floors.push(entity);
        }
    }

    /// Whether a pointer release should attempt a teleport
    pub fn is_active(&self) -> bool {
        self.enabled && !self.floors.is_empty()
    }
}

/// Where the left mouse button went down
#[derive(Resource, Default)]
struct PointerPress {
    start: Option<Vec2>,
}

/// Whether a press/release pair counts as a tap
pub fn is_tap(start: Vec2, end: Vec2) -> bool {
    start.distance(end) <= TAP_SLOP
}

/// Teleport destination for a pointer ray, if it lands on a floor
/// without passing through a model mesh first
pub fn teleport_target(
    origin: Vec3,
    direction: Vec3,
    floors: &[BoundingVolume],
    models: &[BoundingVolume],
    eye_height: f32,
) -> Option<Vec3> {
    unobstructed_floor_hit(origin, direction, floors, models)
        .map(|hit| destination(hit, eye_height))
}

pub struct TeleportPlugin;

impl Plugin for TeleportPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Teleportation>()
            .init_resource::<PointerPress>()
            .add_systems(Update, handle_teleport_pointer);
    }
}

/// World volumes of every registered floor, including mesh children
fn floor_volumes(
    teleportation: &Teleportation,
    children: &Query<&Children>,
    mesh_entities: &Query<(Entity, &Mesh3d, &GlobalTransform)>,
    meshes: &Assets<Mesh>,
) -> Vec<BoundingVolume> {
    teleportation
        .floors
        .iter()
        .flat_map(|&floor| std::iter::once(floor).chain(children.iter_descendants(floor)))
        .filter_map(|entity| {
            let (_, mesh3d, transform) = mesh_entities.get(entity).ok()?;
            let mesh = meshes.get(&mesh3d.0)?;
            mesh_world_volume(mesh, transform)
        })
        .collect()
}

/// Teleport on a mouse click or touch tap that lands on the floor.
/// Drags are left to the camera look controls.
#[allow(clippy::too_many_arguments)]
fn handle_teleport_pointer(
    teleportation: Res<Teleportation>,
    settings: Res<ViewerSettings>,
    mut press: ResMut<PointerPress>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    touch_input: Res<Touches>,
    windows: Query<&Window>,
    meshes: Res<Assets<Mesh>>,
    children: Query<&Children>,
    mesh_entities: Query<(Entity, &Mesh3d, &GlobalTransform)>,
    roles: RoleQuery,
    parents: Query<&ChildOf>,
    mut cameras: Query<(&Camera, &GlobalTransform, &mut Transform), With<MainCamera>>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let cursor = window.cursor_position();

    if mouse_button.just_pressed(MouseButton::Left) {
        press.start = cursor;
    }

    let mut tap: Option<Vec2> = None;
    if mouse_button.just_released(MouseButton::Left) {
        if let (Some(start), Some(end)) = (press.start.take(), cursor) {
            if is_tap(start, end) {
                tap = Some(end);
            }
        }
    }
    for touch in touch_input.iter_just_released() {
        if is_tap(touch.start_position(), touch.position()) {
            tap = Some(touch.position());
        }
    }

    let Some(pos) = tap else {
        return;
    };
    if !teleportation.is_active() {
        return;
    }

    let floors = floor_volumes(&teleportation, &children, &mesh_entities, &meshes);
    let models = collect_framed_volumes(
        &mesh_entities,
        &meshes,
        &roles,
        &parents,
        &settings.floor.renamed_to,
    );
    for (camera, camera_global, mut transform) in cameras.iter_mut() {
        let Ok(ray) = camera.viewport_to_world(camera_global, pos) else {
            continue;
        };
        let eye_height = settings.camera.eye_height;
        match teleport_target(ray.origin, *ray.direction, &floors, &models, eye_height) {
            Some(target) => {
                tracing::info!("Teleporting to {}", target);
                transform.translation = target;
            }
            None => {
                tracing::debug!("Pointer at {} missed the floor or hit the model", pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn test_add_floor_mesh_dedupes() {
        let mut world = World::new();
        let floor = world.spawn_empty().id();

        let mut teleportation = Teleportation::default();
        assert!(!teleportation.is_active());

        teleportation.add_floor_mesh(floor);
        teleportation.add_floor_mesh(floor);
        assert_eq!(teleportation.floors, vec![floor]);
        assert!(!teleportation.is_active());

        teleportation.enabled = true;
        assert!(teleportation.is_active());
    }

    #[test]
    fn test_is_tap() {
        assert!(is_tap(Vec2::new(10.0, 10.0), Vec2::new(13.0, 14.0)));
        assert!(!is_tap(Vec2::new(10.0, 10.0), Vec2::new(30.0, 10.0)));
    }

    #[test]
    fn test_teleport_target_adds_eye_height() {
        let floors = [BoundingVolume::new(
            Vec3::new(-5.0, -0.5, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
        )];
        let target = teleport_target(
            Vec3::new(0.0, 1.6, -4.0),
            Vec3::new(0.0, -1.6, 4.0),
            &floors,
            &[],
            1.6,
        )
        .unwrap();
        assert!(target.distance(Vec3::new(0.0, 1.6, 0.0)) < 1e-5);

        assert_eq!(teleport_target(Vec3::Y, Vec3::Y, &floors, &[], 1.6), None);
    }

    #[test]
    fn test_teleport_skipped_when_model_is_in_the_way() {
        let floors = [BoundingVolume::new(
            Vec3::new(-5.0, -0.5, -5.0),
            Vec3::new(5.0, 0.0, 5.0),
        )];
        let house = [BoundingVolume::new(Vec3::new(-1.0, 0.0, -2.5), Vec3::new(1.0, 2.0, -1.5))];
        let origin = Vec3::new(0.0, 1.6, -4.0);
        let direction = Vec3::new(0.0, -1.6, 4.0);

        assert_eq!(teleport_target(origin, direction, &floors, &house, 1.6), None);

        // The same model off to the side leaves the floor reachable
        let aside = [BoundingVolume::new(Vec3::new(3.0, 0.0, -2.5), Vec3::new(4.0, 2.0, -1.5))];
        assert!(teleport_target(origin, direction, &floors, &aside, 1.6).is_some());
    }

    #[test]
    fn test_floor_volumes_include_children() {
        let mut world = World::new();
        let mut meshes = Assets::<Mesh>::default();
        let plate = meshes.add(Cuboid::new(4.0, 0.2, 4.0));
        world.insert_resource(meshes);

        let floor = world.spawn(Name::new("grass")).id();
        world.spawn((
            Mesh3d(plate),
            GlobalTransform::from_translation(Vec3::new(0.0, -0.1, 0.0)),
            ChildOf(floor),
        ));

        let mut teleportation = Teleportation::default();
        teleportation.add_floor_mesh(floor);

        let volumes = world
            .run_system_once(
                move |children: Query<&Children>,
                      mesh_entities: Query<(Entity, &Mesh3d, &GlobalTransform)>,
                      meshes: Res<Assets<Mesh>>| {
                    floor_volumes(&teleportation, &children, &mesh_entities, &meshes)
                },
            )
            .unwrap();

        assert_eq!(volumes.len(), 1);
        assert!(volumes[0].max.distance(Vec3::new(2.0, 0.0, 2.0)) < 1e-5);
    }
}
