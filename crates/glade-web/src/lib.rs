//! Glade Web - browser front end for the Glade model viewer
//!
//! This crate provides the page glue: configuration from the URL, the Bevy
//! app on the page canvas, the status and VR controls, the model download,
//! and the WebXR session request.

mod app;
mod config;
mod dom;
mod download;
mod xr;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging; `?log=` raises or lowers the level
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(config::log_level())
            .build(),
    );

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_futures::spawn_local(async {
        let config = config::resolve().await;
        app::run(config);
    });

    #[cfg(not(target_arch = "wasm32"))]
    app::run(glade_core::ViewerConfig::default());
}
