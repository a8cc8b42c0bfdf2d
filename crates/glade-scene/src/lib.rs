//! Glade Scene - Bevy scene setup, camera framing, and teleportation
//!
//! This crate turns a loaded glTF model into a viewable scene: it tracks
//! the model load, spawns the camera and light once the scene is ready,
//! prepares the floor mesh, frames the camera on the model, and moves the
//! camera when the user clicks on the floor.

pub mod camera;
pub mod framing;
pub mod loading;
pub mod session;
pub mod setup;
pub mod teleport;
pub mod types;

use bevy::prelude::*;
use glade_core::ViewerConfig;

/// Plugin that sets up the shared 3D scene components
pub struct GladeScenePlugin {
    pub config: ViewerConfig,
}

impl Plugin for GladeScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(types::ViewerSettings(self.config.clone()))
            .init_resource::<types::StatusLine>()
            .add_plugins(camera::CameraPlugin)
            .add_plugins(loading::ModelLoadPlugin)
            .add_plugins(setup::SceneSetupPlugin)
            .add_plugins(framing::FramingPlugin)
            .add_plugins(teleport::TeleportPlugin)
            .add_plugins(session::SessionPlugin);
    }
}

// Re-export commonly used types
pub use camera::{FlyCamera, MainCamera};
pub use loading::{LoadFinished, ModelLoad, ModelLoadSet, ModelRoot, ModelSource, PendingLoadEvents};
pub use session::ViewerSession;
pub use teleport::{TeleportFloor, Teleportation};
pub use types::{MeshTag, StatusLine, ViewerSettings};
