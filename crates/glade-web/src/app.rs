//! Bevy application setup

use bevy::prelude::*;
use glade_core::ViewerConfig;
use glade_scene::GladeScenePlugin;

use crate::dom::PagePlugin;
use crate::download::{downloads_itself, DownloadPlugin};
use crate::xr::XrPlugin;

pub fn run(config: ViewerConfig) {
    let model_url = config.model.model_url();
    tracing::info!("Starting viewer for {}", model_url);

    let mut app = App::new();
    let download = DownloadPlugin::register_source(
        &mut app,
        cfg!(target_arch = "wasm32") && downloads_itself(&model_url),
    );

    app.insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Glade".to_string(),
                    canvas: Some(config.dom.canvas.clone()),
                    fit_canvas_to_parent: true,
                    prevent_default_event_handling: false,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Model and texture URLs are resolved against the page
                file_path: "".to_string(),
                // Don't look for .meta files - static hosts don't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        .add_plugins(GladeScenePlugin { config })
        .add_plugins(PagePlugin)
        .add_plugins(download)
        .add_plugins(XrPlugin)
        .run();
}
