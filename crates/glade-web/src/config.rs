//! Resolving the viewer configuration from the page

use glade_core::config::parse_query_param;
use glade_core::{ViewerConfig, ViewerError};

/// Optional config file served next to the page
pub const CONFIG_FILE: &str = "glade.toml";

/// Map a `?log=` value to a tracing level
pub fn parse_log_level(value: &str) -> Option<tracing::Level> {
    match value.to_ascii_lowercase().as_str() {
        "trace" => Some(tracing::Level::TRACE),
        "debug" => Some(tracing::Level::DEBUG),
        "info" => Some(tracing::Level::INFO),
        "warn" => Some(tracing::Level::WARN),
        "error" => Some(tracing::Level::ERROR),
        _ => None,
    }
}

/// Log level for this page load, `INFO` unless `?log=` says otherwise
pub fn log_level() -> tracing::Level {
    page_search()
        .and_then(|search| parse_query_param(&search, "log"))
        .and_then(|value| parse_log_level(&value))
        .unwrap_or(tracing::Level::INFO)
}

/// Layer the config file text and query string over the defaults.
///
/// A config file that fails to parse is logged and the defaults are kept.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn layer(file: Option<&str>, search: Option<&str>) -> ViewerConfig {
    let mut config = match file.map(ViewerConfig::from_toml) {
        Some(Ok(config)) => {
            tracing::info!("Loaded {}", CONFIG_FILE);
            config
        }
        Some(Err(e)) => {
            tracing::warn!("{}; using defaults", ViewerError::from(e));
            ViewerConfig::default()
        }
        None => ViewerConfig::default(),
    };

    if let Some(search) = search {
        config.apply_query(search);
    }
    config
}

/// Resolve the configuration: defaults, then `glade.toml`, then the URL query
#[cfg(target_arch = "wasm32")]
pub async fn resolve() -> ViewerConfig {
    let file = fetch_config_file().await;
    layer(file.as_deref(), page_search().as_deref())
}

/// Fetch the config file text. A missing file is not an error.
#[cfg(target_arch = "wasm32")]
async fn fetch_config_file() -> Option<String> {
    match gloo_net::http::Request::get(CONFIG_FILE).send().await {
        Ok(response) if response.ok() => response.text().await.ok(),
        Ok(response) => {
            tracing::debug!("No {} ({}), using defaults", CONFIG_FILE, response.status());
            None
        }
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {:?}", CONFIG_FILE, e);
            None
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn page_search() -> Option<String> {
    web_sys::window()?.location().search().ok()
}

#[cfg(not(target_arch = "wasm32"))]
fn page_search() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("debug"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_log_level("WARN"), Some(tracing::Level::WARN));
        assert_eq!(parse_log_level("loud"), None);
    }

    #[test]
    fn test_layer_defaults() {
        assert_eq!(layer(None, None), ViewerConfig::default());
    }

    #[test]
    fn test_layer_query_over_file() {
        let file = r#"
            [model]
            path = "house.glb"

            [light]
            intensity = 0.5
        "#;
        let config = layer(Some(file), Some("?model=farm.glb&floor=Plane"));
        assert_eq!(config.model.path, "farm.glb");
        assert_eq!(config.floor.mesh_name, "Plane");
        assert_eq!(config.light.intensity, 0.5);
    }

    #[test]
    fn test_layer_bad_file_keeps_defaults() {
        let config = layer(Some("[model"), Some("?texture=sand.png"));
        assert_eq!(config.model.path, "scene.glb");
        assert_eq!(config.model.texture_path, "sand.png");
    }
}
