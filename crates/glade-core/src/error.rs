//! Viewer error kinds

use thiserror::Error;

use crate::config::ConfigError;
use crate::framing::FramingError;
use crate::vr::VrError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("Model load error: {0}")]
    LoadFailure(String),
    #[error("VR error: {0}")]
    VrSessionFailure(String),
    #[error("Wait for the model to load")]
    SceneNotReady,
    #[error("Mesh not found: {0}")]
    MeshNotFound(String),
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    #[error(transparent)]
    Framing(#[from] FramingError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<VrError> for ViewerError {
    fn from(e: VrError) -> Self {
        match e {
            VrError::SceneNotReady => ViewerError::SceneNotReady,
            other => ViewerError::VrSessionFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_visible_messages() {
        assert_eq!(
            ViewerError::LoadFailure("HTTP 404: Not Found".into()).to_string(),
            "Model load error: HTTP 404: Not Found"
        );
        assert_eq!(
            ViewerError::VrSessionFailure("WebXR not supported".into()).to_string(),
            "VR error: WebXR not supported"
        );
        assert_eq!(ViewerError::SceneNotReady.to_string(), "Wait for the model to load");
    }

    #[test]
    fn test_from_vr_error() {
        assert_eq!(ViewerError::from(VrError::SceneNotReady), ViewerError::SceneNotReady);
        assert!(matches!(
            ViewerError::from(VrError::AlreadyPending),
            ViewerError::VrSessionFailure(_)
        ));
    }
}
