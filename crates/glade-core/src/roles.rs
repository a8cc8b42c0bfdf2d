//! Mesh role classification
//!
//! Only `Model` meshes take part in camera framing. Roles come from an
//! explicit tag when the asset pipeline provides one, otherwise from the
//! mesh name.

use serde::{Deserialize, Serialize};

/// Semantic role of a mesh in the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshRole {
    #[default]
    Model,
    /// Teleportation floor
    Floor,
    /// Helper geometry (teleport markers, rotation cones)
    Utility,
}

impl MeshRole {
    /// Parse an explicit role tag, case-insensitively
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "model" => Some(MeshRole::Model),
            "floor" | "ground" | "teleport_floor" => Some(MeshRole::Floor),
            "utility" | "helper" => Some(MeshRole::Utility),
            _ => None,
        }
    }

    pub fn is_framed(self) -> bool {
        self == MeshRole::Model
    }
}

/// Name fragments that mark helper meshes spawned for teleportation
const UTILITY_NAME_FRAGMENTS: &[&str] = &["teleportation", "rotationCone"];

/// Classify a mesh from its name and optional explicit tag.
///
/// `floor_name` is the name the floor mesh carries after setup renames it.
/// Name matching is a case-sensitive exact/substring match; an unknown tag
/// falls through to the name heuristic.
pub fn classify(name: &str, tag: Option<&str>, floor_name: &str) -> MeshRole {
    if let Some(role) = tag.and_then(MeshRole::from_tag) {
        return role;
    }

    if name == floor_name {
        return MeshRole::Floor;
    }

    if UTILITY_NAME_FRAGMENTS.iter().any(|frag| name.contains(frag)) {
        return MeshRole::Utility;
    }

    MeshRole::Model
}
