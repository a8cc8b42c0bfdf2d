//! glTF model loading
//!
//! The model is loaded through the asset server, either straight from its
//! URL or, with [`ModelSource::Host`], from bytes the host page downloaded
//! itself. Load events come from two places: this module (asset and scene
//! readiness) and the host page (download progress and failures), which
//! pushes into [`PendingLoadEvents`] from browser callbacks. Both are folded into one [`LoadTracker`], so the app
//! sees exactly one [`LoadFinished`] message.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use bevy::scene::{SceneInstance, SceneSpawner};
use glade_core::{LoadEvent, LoadOutcome, LoadTracker, SceneSummary, StatusMessage, ViewerError};
use glade_core::loading::LoadUpdate;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::types::{StatusLine, ViewerSettings};

/// Load events queued from outside the ECS (browser callbacks)
#[derive(Resource, Default, Clone)]
pub struct PendingLoadEvents(pub Arc<Mutex<VecDeque<LoadEvent>>>);

impl PendingLoadEvents {
    pub fn push(&self, event: LoadEvent) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push_back(event);
        }
    }

    fn drain(&self) -> Vec<LoadEvent> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// State of the single model load
#[derive(Resource, Default)]
pub struct ModelLoad {
    /// Asset path of the model
    pub url: String,
    pub gltf: Option<Handle<Gltf>>,
    /// Entity holding the spawned scene
    pub root: Option<Entity>,
    pub tracker: LoadTracker,
    scene_ready: bool,
}

impl ModelLoad {
    /// Start tracking the asset load of `asset_path`
    pub fn begin(&mut self, asset_path: String, handle: Handle<Gltf>) {
        self.url = asset_path;
        self.gltf = Some(handle);
    }
}

/// Who fetches the model file
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelSource {
    /// The asset server requests the model URL
    #[default]
    Direct,
    /// The host downloads the file and calls [`ModelLoad::begin`] once the
    /// bytes are readable by the asset server
    Host,
}

/// Marker for the spawned model scene root
#[derive(Component)]
pub struct ModelRoot;

/// Sent once, when the load reaches its terminal outcome
#[derive(Message, Debug, Clone)]
pub struct LoadFinished(pub LoadOutcome);

/// Systems that advance the model load
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelLoadSet;

pub struct ModelLoadPlugin;

impl Plugin for ModelLoadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelLoad>()
            .init_resource::<ModelSource>()
            .init_resource::<PendingLoadEvents>()
            .add_message::<LoadFinished>()
            .add_systems(Startup, start_model_load)
            .add_systems(
                Update,
                (poll_model_asset, detect_scene_ready, process_load_events)
                    .chain()
                    .in_set(ModelLoadSet),
            );
    }
}

fn start_model_load(
    mut model_load: ResMut<ModelLoad>,
    source: Res<ModelSource>,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
    mut status: ResMut<StatusLine>,
) {
    status.set(StatusMessage::loading_started());
    let url = settings.model.model_url();
    if *source == ModelSource::Host {
        tracing::info!("Waiting for the page to download model: {}", url);
        return;
    }

    tracing::info!("Starting to load model: {}", url);
    let handle: Handle<Gltf> = asset_server.load(&url);
    model_load.begin(url, handle);
}

/// Check the glTF load state and spawn its scene once loaded
fn poll_model_asset(
    mut commands: Commands,
    mut model_load: ResMut<ModelLoad>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    pending: Res<PendingLoadEvents>,
) {
    if model_load.root.is_some() || model_load.tracker.is_finished() {
        return;
    }
    let Some(handle) = model_load.gltf.clone() else {
        return;
    };

    match asset_server.get_load_state(handle.id()) {
        Some(LoadState::Loaded) => {
            let Some(gltf) = gltf_assets.get(&handle) else {
                return;
            };
            let scene = gltf
                .default_scene
                .clone()
                .or_else(|| gltf.scenes.first().cloned());

            match scene {
                Some(scene_handle) => {
                    tracing::info!("Model loaded: {}", model_load.url);
                    let root = commands
                        .spawn((SceneRoot(scene_handle), ModelRoot, Name::new("model")))
                        .id();
                    model_load.root = Some(root);
                }
                None => {
                    pending.push(LoadEvent::Failed(format!(
                        "{} contains no scenes",
                        model_load.url
                    )));
                }
            }
        }
        Some(LoadState::Failed(err)) => {
            pending.push(LoadEvent::Failed(err.to_string()));
        }
        _ => {
            // Still loading
        }
    }
}

/// Report completion once every entity of the scene has been spawned
fn detect_scene_ready(
    mut model_load: ResMut<ModelLoad>,
    scene_spawner: Res<SceneSpawner>,
    roots: Query<&SceneInstance, With<ModelRoot>>,
    children: Query<&Children>,
    meshes: Query<(), With<Mesh3d>>,
    named: Query<(&Name, &Transform)>,
    pending: Res<PendingLoadEvents>,
) {
    if model_load.scene_ready {
        return;
    }
    let Some(root) = model_load.root else {
        return;
    };
    let Ok(instance) = roots.get(root) else {
        return;
    };
    if !scene_spawner.instance_is_ready(**instance) {
        return;
    }

    model_load.scene_ready = true;

    let mut mesh_count = 0;
    for (i, entity) in children.iter_descendants(root).enumerate() {
        if meshes.contains(entity) {
            mesh_count += 1;
        }
        if let Ok((name, transform)) = named.get(entity) {
            tracing::debug!("{}: {} - position: {}", i, name, transform.translation);
        }
    }

    tracing::info!("Scene ready with {} meshes", mesh_count);
    pending.push(LoadEvent::Completed(SceneSummary { mesh_count }));
}

/// Fold queued events into the tracker and publish the terminal outcome
fn process_load_events(
    mut model_load: ResMut<ModelLoad>,
    pending: Res<PendingLoadEvents>,
    mut status: ResMut<StatusLine>,
    mut finished: MessageWriter<LoadFinished>,
) {
    for event in pending.drain() {
        if let LoadUpdate::Progress(percent) = model_load.tracker.apply(event) {
            status.set(StatusMessage::loading_progress(percent));
        }
    }

    let Some(outcome) = model_load.tracker.take_outcome() else {
        return;
    };

    match &outcome {
        LoadOutcome::Loaded(summary) => {
            tracing::info!("Model loaded, {} meshes in scene", summary.mesh_count);
            status.set(StatusMessage::loaded(summary));
        }
        LoadOutcome::Failed(reason) => {
            let error = ViewerError::LoadFailure(reason.clone());
            tracing::error!("{}", error);
            status.set(StatusMessage::from(&error));
        }
    }

    finished.write(LoadFinished(outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::message::Messages;
    use bevy::ecs::system::RunSystemOnce;

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<ModelLoad>();
        world.init_resource::<PendingLoadEvents>();
        world.init_resource::<StatusLine>();
        world.init_resource::<Messages<LoadFinished>>();
        world
    }

    fn finished_count(world: &World) -> usize {
        world.resource::<Messages<LoadFinished>>().len()
    }

    #[test]
    fn test_progress_updates_status() {
        let mut world = world();
        world
            .resource::<PendingLoadEvents>()
            .push(LoadEvent::Progress { loaded: 3, total: 4 });
        world.run_system_once(process_load_events).unwrap();

        assert_eq!(world.resource::<StatusLine>().message.text, "Loading model... 75%");
        assert_eq!(finished_count(&world), 0);
    }

    #[test]
    fn test_single_finished_message() {
        let mut world = world();
        let pending = world.resource::<PendingLoadEvents>().clone();
        pending.push(LoadEvent::Completed(SceneSummary { mesh_count: 4 }));
        pending.push(LoadEvent::Failed("late error".to_string()));
        world.run_system_once(process_load_events).unwrap();

        pending.push(LoadEvent::Progress { loaded: 1, total: 2 });
        world.run_system_once(process_load_events).unwrap();

        assert_eq!(finished_count(&world), 1);
        let status = world.resource::<StatusLine>();
        assert_eq!(status.message.text, "Model loaded! Objects: 4");
        assert!(!status.message.is_error());
    }

    #[test]
    fn test_failure_shows_error() {
        let mut world = world();
        world
            .resource::<PendingLoadEvents>()
            .push(LoadEvent::Failed("HTTP 404".to_string()));
        world.run_system_once(process_load_events).unwrap();

        let status = world.resource::<StatusLine>();
        assert_eq!(status.message.text, "Model load error: HTTP 404");
        assert_eq!(status.message.color(), "red");
        assert_eq!(finished_count(&world), 1);
    }

    #[test]
    fn test_host_source_leaves_fetch_to_the_page() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .insert_resource(ViewerSettings(glade_core::ViewerConfig::default()))
            .insert_resource(ModelSource::Host)
            .init_resource::<ModelLoad>()
            .init_resource::<StatusLine>();

        let world = app.world_mut();
        world.run_system_once(start_model_load).unwrap();

        assert!(world.resource::<ModelLoad>().gltf.is_none());
        assert_eq!(world.resource::<StatusLine>().message.text, "Loading model...");

        let handle = Handle::<Gltf>::default();
        world
            .resource_mut::<ModelLoad>()
            .begin("glade://scene.glb".to_string(), handle.clone());
        let model_load = world.resource::<ModelLoad>();
        assert_eq!(model_load.url, "glade://scene.glb");
        assert_eq!(model_load.gltf, Some(handle));
    }
}
