//! Handles to the entities that make up the running scene

use bevy::app::AppExit;
use bevy::prelude::*;
use glade_core::SceneSummary;

/// Entities created for a loaded model. Inserted once scene setup is done
/// and removed when the app exits.
#[derive(Resource, Debug, Clone)]
pub struct ViewerSession {
    pub scene_root: Entity,
    pub camera: Entity,
    pub light: Entity,
    /// Floor mesh, if the model has one
    pub floor: Option<Entity>,
    pub summary: SceneSummary,
}

pub struct SessionPlugin;

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Last, teardown_session);
    }
}

fn teardown_session(
    mut commands: Commands,
    mut exit: MessageReader<AppExit>,
    session: Option<Res<ViewerSession>>,
) {
    if exit.read().count() == 0 {
        return;
    }
    if let Some(session) = session {
        tracing::info!(
            "Closing viewer session ({} meshes)",
            session.summary.mesh_count
        );
        commands.remove_resource::<ViewerSession>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_removed_on_exit() {
        let mut app = App::new();
        app.add_message::<AppExit>().add_plugins(SessionPlugin);

        let root = app.world_mut().spawn_empty().id();
        app.insert_resource(ViewerSession {
            scene_root: root,
            camera: root,
            light: root,
            floor: None,
            summary: SceneSummary { mesh_count: 3 },
        });

        app.update();
        assert!(app.world().contains_resource::<ViewerSession>());

        app.world_mut().write_message(AppExit::Success);
        app.update();
        assert!(!app.world().contains_resource::<ViewerSession>());
    }
}
