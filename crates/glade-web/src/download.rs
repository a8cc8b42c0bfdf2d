//! Model download
//!
//! A `.glb` model is fetched once by the page: the response body is read
//! as a stream to report byte progress, then the bytes are handed to the
//! asset server through an in-memory asset source. A `.gltf` model points
//! at sibling buffers and textures, so it is left to the asset server.

use bevy::asset::io::memory::{Dir, MemoryAssetReader};
use bevy::asset::io::AssetSource;
use bevy::asset::AssetApp;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use glade_core::LoadEvent;
use glade_scene::loading::ModelLoadSet;
use glade_scene::{ModelLoad, ModelSource, PendingLoadEvents, ViewerSettings};
use std::sync::{Arc, Mutex};

/// Asset source serving the downloaded model
pub const DOWNLOAD_SOURCE: &str = "glade";

/// Stored name when the URL has no usable file name
const FALLBACK_FILE_NAME: &str = "model.glb";

/// Whether the page downloads `url` itself
pub fn downloads_itself(url: &str) -> bool {
    download_file_name(url).to_ascii_lowercase().ends_with(".glb")
}

/// Last path segment of `url`, without query or fragment
pub fn download_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => FALLBACK_FILE_NAME.to_string(),
    }
}

/// Asset path the downloaded bytes are served under
pub fn download_asset_path(file_name: &str) -> String {
    format!("{}://{}", DOWNLOAD_SOURCE, file_name)
}

/// Parse a `Content-Length` header; missing or malformed means unknown (0)
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn content_length(header: Option<&str>) -> u64 {
    header
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

/// Body bytes received so far
#[derive(Debug, Default)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub struct DownloadBuffer {
    bytes: Vec<u8>,
    total: u64,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl DownloadBuffer {
    pub fn new(total: u64) -> Self {
        Self {
            bytes: Vec::with_capacity(total.min(256 * 1024 * 1024) as usize),
            total,
        }
    }

    /// Append a chunk and report the new progress
    pub fn push_chunk(&mut self, chunk: &[u8]) -> LoadEvent {
        self.bytes.extend_from_slice(chunk);
        LoadEvent::Progress {
            loaded: self.bytes.len() as u64,
            total: self.total,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Asset path of the model, set once its bytes are readable
#[derive(Resource, Default, Clone)]
pub struct DownloadedModel(Arc<Mutex<Option<String>>>);

impl DownloadedModel {
    pub fn set(&self, asset_path: String) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(asset_path);
        }
    }

    pub fn take(&self) -> Option<String> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// In-memory directory behind [`DOWNLOAD_SOURCE`]
#[derive(Resource, Clone)]
struct DownloadDir(Dir);

pub struct DownloadPlugin {
    dir: Dir,
    /// Download the model in the page instead of through the asset server
    pub enabled: bool,
}

impl DownloadPlugin {
    /// Register the in-memory asset source. Asset sources must exist
    /// before `AssetPlugin` is added.
    pub fn register_source(app: &mut App, enabled: bool) -> Self {
        let dir = Dir::default();
        let reader_dir = dir.clone();
        app.register_asset_source(
            DOWNLOAD_SOURCE,
            AssetSource::build().with_reader(move || {
                Box::new(MemoryAssetReader {
                    root: reader_dir.clone(),
                })
            }),
        );
        Self { dir, enabled }
    }
}

impl Plugin for DownloadPlugin {
    fn build(&self, app: &mut App) {
        if !self.enabled {
            return;
        }
        app.insert_resource(ModelSource::Host)
            .insert_resource(DownloadDir(self.dir.clone()))
            .init_resource::<DownloadedModel>()
            .add_systems(Startup, start_download)
            .add_systems(Update, load_downloaded_model.before(ModelLoadSet));
    }
}

fn start_download(
    settings: Res<ViewerSettings>,
    pending: Res<PendingLoadEvents>,
    dir: Res<DownloadDir>,
    downloaded: Res<DownloadedModel>,
) {
    let url = settings.model.model_url();
    let file_name = download_file_name(&url);
    tracing::info!("Downloading model {} as {}", url, download_asset_path(&file_name));
    js_interop::download(url, file_name, dir.0.clone(), pending.clone(), downloaded.clone());
}

/// Hand the downloaded model to the asset server
fn load_downloaded_model(
    downloaded: Res<DownloadedModel>,
    asset_server: Res<AssetServer>,
    mut model_load: ResMut<ModelLoad>,
) {
    let Some(asset_path) = downloaded.take() else {
        return;
    };
    tracing::debug!("Loading downloaded model from {}", asset_path);
    let handle: Handle<Gltf> = asset_server.load(asset_path.clone());
    model_load.begin(asset_path, handle);
}

#[cfg(target_arch = "wasm32")]
mod js_interop {
    use super::*;
    use std::path::Path;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::{spawn_local, JsFuture};
    use web_sys::ReadableStreamDefaultReader;

    pub fn download(
        url: String,
        file_name: String,
        dir: Dir,
        pending: PendingLoadEvents,
        downloaded: DownloadedModel,
    ) {
        spawn_local(async move {
            match fetch_bytes(&url, &pending).await {
                Ok(bytes) => {
                    tracing::info!("Downloaded {} ({} bytes)", url, bytes.len());
                    dir.insert_asset(Path::new(&file_name), bytes);
                    downloaded.set(download_asset_path(&file_name));
                }
                Err(e) => {
                    tracing::error!("Download of {} failed: {}", url, e);
                    pending.push(LoadEvent::Failed(e));
                }
            }
        });
    }

    async fn fetch_bytes(url: &str, pending: &PendingLoadEvents) -> Result<Vec<u8>, String> {
        let response = gloo_net::http::Request::get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.ok() {
            return Err(format!("HTTP {} {}", response.status(), response.status_text()));
        }

        let total = content_length(response.headers().get("content-length").as_deref());
        let Some(body) = response.body() else {
            return response.binary().await.map_err(|e| e.to_string());
        };
        let reader = body
            .get_reader()
            .dyn_into::<ReadableStreamDefaultReader>()
            .map_err(|_| "body reader is not a default reader".to_string())?;

        let mut buffer = DownloadBuffer::new(total);
        loop {
            let chunk = JsFuture::from(reader.read())
                .await
                .map_err(|e| format!("{:?}", e))?;
            let done = js_sys::Reflect::get(&chunk, &"done".into())
                .ok()
                .and_then(|v| v.as_bool())
                .unwrap_or(true);
            if done {
                return Ok(buffer.into_bytes());
            }

            if let Ok(value) = js_sys::Reflect::get(&chunk, &"value".into()) {
                let bytes = js_sys::Uint8Array::new(&value).to_vec();
                pending.push(buffer.push_chunk(&bytes));
            }
        }
    }
}

// Non-WASM stubs
#[cfg(not(target_arch = "wasm32"))]
mod js_interop {
    use super::*;

    pub fn download(
        url: String,
        _file_name: String,
        _dir: Dir,
        pending: PendingLoadEvents,
        _downloaded: DownloadedModel,
    ) {
        pending.push(LoadEvent::Failed(format!(
            "cannot download {} outside the browser",
            url
        )));
    }
}
