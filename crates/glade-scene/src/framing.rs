//! Applying the auto-framer to the live camera

use bevy::gltf::GltfExtras;
use bevy::prelude::*;
use bevy::camera::primitives::MeshAabb;
use glade_core::{BoundingVolume, MeshRole, classify, frame_or_fallback};

use crate::camera::{FlyCamera, MainCamera, place_camera};
use crate::types::{MeshTag, ViewerSettings};

/// Request to re-frame the camera on the model
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct FrameCamera;

/// Key extras field carrying an explicit mesh role
const ROLE_EXTRAS_KEY: &str = "glade_role";

/// Per-entity data used to decide a mesh's role
pub type RoleQuery<'w, 's> = Query<
    'w,
    's,
    (
        Option<&'static Name>,
        Option<&'static MeshTag>,
        Option<&'static GltfExtras>,
    ),
>;

/// Systems that move the camera onto the model
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct FramingSet;

pub struct FramingPlugin;

impl Plugin for FramingPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FrameCamera>()
            .add_systems(
                Update,
                (reframe_on_key, frame_camera).chain().in_set(FramingSet),
            );
    }
}

/// Read an explicit role tag from glTF extras JSON
pub fn role_tag_from_extras(extras: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(extras).ok()?;
    value.get(ROLE_EXTRAS_KEY)?.as_str().map(str::to_string)
}

/// Role of a mesh entity, looking at it and its ancestors.
///
/// An explicit [`MeshTag`] or extras tag on the nearest entity wins. Without
/// one, any name in the chain that the name heuristic marks as floor or
/// utility excludes the mesh.
pub fn mesh_role(
    entity: Entity,
    roles: &RoleQuery,
    parents: &Query<&ChildOf>,
    floor_name: &str,
) -> MeshRole {
    let mut by_name = MeshRole::Model;

    for e in std::iter::once(entity).chain(parents.iter_ancestors(entity)) {
        let Ok((name, tag, extras)) = roles.get(e) else {
            continue;
        };

        if let Some(tag) = tag {
            return tag.0;
        }

        let extras_tag = extras.and_then(|x| role_tag_from_extras(&x.value));
        let name = name.map(Name::as_str).unwrap_or("");
        let role = classify(name, extras_tag.as_deref(), floor_name);

        if extras_tag.as_deref().and_then(MeshRole::from_tag).is_some() {
            return role;
        }
        if by_name == MeshRole::Model && !name.is_empty() {
            by_name = role;
        }
    }

    by_name
}

/// World-space volume of a mesh under a global transform
pub fn mesh_world_volume(mesh: &Mesh, transform: &GlobalTransform) -> Option<BoundingVolume> {
    let aabb = mesh.compute_aabb()?;
    Some(BoundingVolume::from_local(
        Vec3::from(aabb.center),
        Vec3::from(aabb.half_extents),
        &transform.affine(),
    ))
}

/// Collect world volumes of every mesh whose role takes part in framing
pub fn collect_framed_volumes(
    mesh_entities: &Query<(Entity, &Mesh3d, &GlobalTransform)>,
    meshes: &Assets<Mesh>,
    roles: &RoleQuery,
    parents: &Query<&ChildOf>,
    floor_name: &str,
) -> Vec<BoundingVolume> {
    mesh_entities
        .iter()
        .filter(|(entity, _, _)| mesh_role(*entity, roles, parents, floor_name).is_framed())
        .filter_map(|(_, mesh3d, transform)| {
            let mesh = meshes.get(&mesh3d.0)?;
            mesh_world_volume(mesh, transform)
        })
        .collect()
}

fn reframe_on_key(keyboard: Res<ButtonInput<KeyCode>>, mut requests: MessageWriter<FrameCamera>) {
    if keyboard.just_pressed(KeyCode::KeyF) {
        requests.write(FrameCamera);
    }
}

pub(crate) fn frame_camera(
    mut requests: MessageReader<FrameCamera>,
    settings: Res<ViewerSettings>,
    meshes: Res<Assets<Mesh>>,
    mesh_entities: Query<(Entity, &Mesh3d, &GlobalTransform)>,
    roles: RoleQuery,
    parents: Query<&ChildOf>,
    mut cameras: Query<(&mut Transform, &mut FlyCamera), With<MainCamera>>,
) {
    if requests.read().count() == 0 {
        return;
    }

    let floor_name = &settings.floor.renamed_to;
    let volumes = collect_framed_volumes(&mesh_entities, &meshes, &roles, &parents, floor_name);
    if volumes.is_empty() {
        tracing::warn!("No model meshes found for camera framing");
    } else {
        tracing::info!("Framing camera on {} meshes", volumes.len());
    }

    let result = frame_or_fallback(&volumes, &settings.camera.framing);
    tracing::info!(
        "Camera framed: target {}, distance {:.2}, position {}",
        result.target,
        result.distance,
        result.position
    );

    for (mut transform, mut fly) in cameras.iter_mut() {
        place_camera(&mut transform, &mut fly, result.position, result.target);
    }
}
