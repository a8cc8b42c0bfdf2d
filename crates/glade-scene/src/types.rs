//! Shared resources and components

use bevy::prelude::*;
use glade_core::{MeshRole, StatusMessage, ViewerConfig};

/// Resolved viewer configuration
#[derive(Debug, Clone, Resource, Deref)]
pub struct ViewerSettings(pub ViewerConfig);

/// Explicit semantic role for a mesh, overriding the name heuristic
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshTag(pub MeshRole);

/// Text shown in the page's status element
#[derive(Debug, Clone, Resource)]
pub struct StatusLine {
    pub message: StatusMessage,
    pub visible: bool,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: StatusMessage::info(""),
            visible: true,
        }
    }
}

impl StatusLine {
    /// Show a message, making the element visible again
    pub fn set(&mut self, message: StatusMessage) {
        self.message = message;
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }
}
