//! Viewer configuration
//!
//! Resolved in three layers: built-in defaults, an optional `glade.toml`
//! served next to the page, then URL query parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::framing::FramingParams;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to parse viewer config: {0}")]
    Parse(String),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ViewerConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub floor: FloorConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub xr: XrConfig,
    #[serde(default)]
    pub dom: DomConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL the model and texture paths are resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// glTF binary to load
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Floor texture image
    #[serde(default = "default_texture_path")]
    pub texture_path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            path: default_model_path(),
            texture_path: default_texture_path(),
        }
    }
}

impl ModelConfig {
    pub fn model_url(&self) -> String {
        join_url(&self.base_url, &self.path)
    }

    pub fn texture_url(&self) -> String {
        join_url(&self.base_url, &self.texture_path)
    }
}

fn default_base_url() -> String {
    "./".to_string()
}

fn default_model_path() -> String {
    "scene.glb".to_string()
}

fn default_texture_path() -> String {
    "grass.jpg".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorConfig {
    /// Name of the mesh in the model used as the floor
    #[serde(default = "default_floor_mesh")]
    pub mesh_name: String,
    /// Name the floor mesh is given after setup
    #[serde(default = "default_floor_rename")]
    pub renamed_to: String,
    /// Horizontal (X and Z) scale applied to the floor
    #[serde(default = "default_floor_scale")]
    pub scale: f32,
    /// Texture repeat count along U and V
    #[serde(default = "default_texture_repeat")]
    pub texture_repeat: f32,
}

impl Default for FloorConfig {
    fn default() -> Self {
        Self {
            mesh_name: default_floor_mesh(),
            renamed_to: default_floor_rename(),
            scale: default_floor_scale(),
            texture_repeat: default_texture_repeat(),
        }
    }
}

fn default_floor_mesh() -> String {
    "Cylinder.007".to_string()
}

fn default_floor_rename() -> String {
    "grass".to_string()
}

fn default_floor_scale() -> f32 {
    2.0
}

fn default_texture_repeat() -> f32 {
    10.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Initial position before framing
    #[serde(default = "default_camera_start")]
    pub start: [f32; 3],
    /// Movement per frame at 60 Hz
    #[serde(default = "default_camera_speed")]
    pub speed: f32,
    /// Pixels of mouse motion per radian of rotation
    #[serde(default = "default_angular_sensibility")]
    pub angular_sensibility: f32,
    /// Near clipping plane
    #[serde(default = "default_camera_near")]
    pub near: f32,
    /// Eye height above the floor after a teleport
    #[serde(default = "default_eye_height")]
    pub eye_height: f32,
    #[serde(default)]
    pub framing: FramingParams,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start: default_camera_start(),
            speed: default_camera_speed(),
            angular_sensibility: default_angular_sensibility(),
            near: default_camera_near(),
            eye_height: default_eye_height(),
            framing: FramingParams::default(),
        }
    }
}

fn default_camera_start() -> [f32; 3] {
    [0.0, 1.6, -5.0]
}

fn default_camera_speed() -> f32 {
    0.3
}

fn default_angular_sensibility() -> f32 {
    2000.0
}

fn default_camera_near() -> f32 {
    0.1
}

fn default_eye_height() -> f32 {
    1.6
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_intensity")]
    pub intensity: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            intensity: default_light_intensity(),
        }
    }
}

fn default_light_intensity() -> f32 {
    0.7
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct XrConfig {
    #[serde(default)]
    pub disable_teleportation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomConfig {
    /// CSS selector of the render canvas
    #[serde(default = "default_canvas")]
    pub canvas: String,
    /// Id of the status text element
    #[serde(default = "default_status_id")]
    pub status: String,
    /// Id of the enter-VR button
    #[serde(default = "default_vr_button_id")]
    pub vr_button: String,
    /// Class of the XR icon control, which may appear late
    #[serde(default = "default_xr_icon_class")]
    pub xr_icon_class: String,
}

impl Default for DomConfig {
    fn default() -> Self {
        Self {
            canvas: default_canvas(),
            status: default_status_id(),
            vr_button: default_vr_button_id(),
            xr_icon_class: default_xr_icon_class(),
        }
    }
}

fn default_canvas() -> String {
    "#glade-canvas".to_string()
}

fn default_status_id() -> String {
    "loading".to_string()
}

fn default_vr_button_id() -> String {
    "vrButton".to_string()
}

fn default_xr_icon_class() -> String {
    "xr-icon".to_string()
}

impl ViewerConfig {
    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `?model=`, `?texture=`, `?base=` and `?floor=` overrides from a URL query string
    pub fn apply_query(&mut self, search: &str) {
        if let Some(model) = parse_query_param(search, "model") {
            tracing::info!("Using model from URL parameter: {}", model);
            self.model.path = model;
        }
        if let Some(texture) = parse_query_param(search, "texture") {
            self.model.texture_path = texture;
        }
        if let Some(base) = parse_query_param(search, "base") {
            self.model.base_url = base;
        }
        if let Some(floor) = parse_query_param(search, "floor") {
            self.floor.mesh_name = floor;
        }
    }
}

/// Parse a query parameter from a search string
pub fn parse_query_param(search: &str, param: &str) -> Option<String> {
    let search = search.trim_start_matches('?');
    for pair in search.split('&') {
        let mut parts = pair.splitn(2, '=');
        if let (Some(key), Some(value)) = (parts.next(), parts.next()) {
            if key == param && !value.is_empty() {
                return Some(
                    value
                        .replace("%3A", ":")
                        .replace("%2F", "/")
                        .replace("%20", " ")
                        .replace('+', " "),
                );
            }
        }
    }
    None
}

/// Join a base URL and a relative path with exactly one slash between them
fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") || base.is_empty() {
        return path.to_string();
    }
    let path = path.strip_prefix("./").unwrap_or(path);
    if base == "./" {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
