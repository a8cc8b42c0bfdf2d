//! Scene setup after the model has loaded - camera, light, and floor

use bevy::ecs::schedule::ApplyDeferred;
use bevy::image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use bevy::math::Affine2;
use bevy::prelude::*;
use glade_core::config::{FloorConfig, LightConfig};
use glade_core::{LoadOutcome, MeshRole, ViewerError};

use crate::camera::spawn_camera;
use crate::framing::FrameCamera;
use crate::loading::{LoadFinished, ModelLoad};
use crate::session::ViewerSession;
use crate::teleport::{TeleportFloor, Teleportation};
use crate::types::{MeshTag, ViewerSettings};

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (setup_scene_after_load, ApplyDeferred, texture_floor)
                .chain()
                .after(crate::loading::ModelLoadSet)
                .before(crate::framing::FramingSet),
        );
    }
}

/// Find a named entity. Returns `None` when nothing carries the name.
pub fn find_mesh_by_name(named: &Query<(Entity, &Name)>, name: &str) -> Option<Entity> {
    named
        .iter()
        .find(|(_, n)| n.as_str() == name)
        .map(|(entity, _)| entity)
}

/// Spawn a sky-to-ground light: soft ambient fill plus a light from straight above
pub fn spawn_light(commands: &mut Commands, config: &LightConfig) -> Entity {
    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.9, 0.95, 1.0),
        brightness: 1000.0 * config.intensity,
        ..default()
    });

    commands
        .spawn((
            DirectionalLight {
                illuminance: 10_000.0 * config.intensity,
                shadows_enabled: false,
                ..default()
            },
            Transform::from_xyz(0.0, 10.0, 0.0).looking_at(Vec3::ZERO, Vec3::Z),
            Name::new("light"),
        ))
        .id()
}

/// Transform applied to the floor mesh: resting on y = 0, stretched horizontally
pub fn floor_transform(current: &Transform, config: &FloorConfig) -> Transform {
    let mut transform = *current;
    transform.translation.y = 0.0;
    transform.scale.x = config.scale;
    transform.scale.z = config.scale;
    transform
}

fn grass_material(
    asset_server: &AssetServer,
    materials: &mut Assets<StandardMaterial>,
    texture_url: &str,
    repeat: f32,
) -> Handle<StandardMaterial> {
    let texture: Handle<Image> = asset_server.load_with_settings(
        texture_url.to_string(),
        |settings: &mut ImageLoaderSettings| {
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                address_mode_u: ImageAddressMode::Repeat,
                address_mode_v: ImageAddressMode::Repeat,
                ..default()
            });
        },
    );

    materials.add(StandardMaterial {
        base_color_texture: Some(texture),
        uv_transform: Affine2::from_scale(Vec2::splat(repeat)),
        perceptual_roughness: 0.9,
        ..default()
    })
}

fn setup_scene_after_load(
    mut commands: Commands,
    mut finished: MessageReader<LoadFinished>,
    settings: Res<ViewerSettings>,
    model_load: Res<ModelLoad>,
    mut teleportation: ResMut<Teleportation>,
    named: Query<(Entity, &Name)>,
    children: Query<&Children>,
    mesh_entities: Query<(), With<Mesh3d>>,
    mut transforms: Query<&mut Transform>,
    mut frame_requests: MessageWriter<FrameCamera>,
) {
    for LoadFinished(outcome) in finished.read() {
        let LoadOutcome::Loaded(summary) = outcome else {
            continue;
        };
        let Some(scene_root) = model_load.root else {
            continue;
        };

        let camera = spawn_camera(&mut commands, &settings.camera);
        let light = spawn_light(&mut commands, &settings.light);

        let floor_config = &settings.floor;
        let floor = find_mesh_by_name(&named, &floor_config.mesh_name);
        match floor {
            Some(floor) => {
                if let Ok(mut transform) = transforms.get_mut(floor) {
                    *transform = floor_transform(&transform, floor_config);
                }

                commands.entity(floor).insert((
                    Name::new(floor_config.renamed_to.clone()),
                    MeshTag(MeshRole::Floor),
                    TeleportFloor,
                ));
                for entity in std::iter::once(floor).chain(children.iter_descendants(floor)) {
                    if mesh_entities.contains(entity) {
                        commands.entity(entity).insert(MeshTag(MeshRole::Floor));
                    }
                }

                teleportation.enabled = !settings.xr.disable_teleportation;
                teleportation.add_floor_mesh(floor);
                tracing::info!(
                    "Floor mesh '{}' prepared as '{}'",
                    floor_config.mesh_name,
                    floor_config.renamed_to
                );
            }
            None => {
                let error = ViewerError::MeshNotFound(floor_config.mesh_name.clone());
                tracing::warn!("{}; teleportation disabled", error);
                teleportation.enabled = false;
            }
        }

        commands.insert_resource(ViewerSession {
            scene_root,
            camera,
            light,
            floor,
            summary: summary.clone(),
        });
        frame_requests.write(FrameCamera);
    }
}

/// Give a newly prepared floor the repeating grass texture
fn texture_floor(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    floors: Query<Entity, Added<TeleportFloor>>,
    children: Query<&Children>,
    mesh_entities: Query<(), With<Mesh3d>>,
) {
    for floor in floors.iter() {
        let material = grass_material(
            &asset_server,
            &mut materials,
            &settings.model.texture_url(),
            settings.floor.texture_repeat,
        );
        for entity in std::iter::once(floor).chain(children.iter_descendants(floor)) {
            if mesh_entities.contains(entity) {
                commands.entity(entity).insert(MeshMaterial3d(material.clone()));
            }
        }
    }
}
