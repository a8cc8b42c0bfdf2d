//! User-visible status messages

use crate::error::ViewerError;
use crate::loading::SceneSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Error,
}

/// Plain-text message for the status element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }

    pub fn loading_started() -> Self {
        Self::info("Loading model...")
    }

    pub fn loading_progress(percent: Option<u32>) -> Self {
        match percent {
            Some(p) => Self::info(format!("Loading model... {}%", p)),
            None => Self::loading_started(),
        }
    }

    pub fn loaded(summary: &SceneSummary) -> Self {
        Self::info(format!("Model loaded! Objects: {}", summary.mesh_count))
    }

    pub fn vr_starting() -> Self {
        Self::info("Starting VR...")
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// CSS color for the status element
    pub fn color(&self) -> &'static str {
        match self.severity {
            Severity::Info => "",
            Severity::Error => "red",
        }
    }
}

impl From<&ViewerError> for StatusMessage {
    fn from(e: &ViewerError) -> Self {
        StatusMessage::error(e.to_string())
    }
}
