//! VR trigger state machine
//!
//! The enter-VR control is hidden until the model is loaded, and at most
//! one session request may be in flight. A failed request returns the
//! trigger to `Ready` so the user can retry by hand.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VrError {
    #[error("Scene is not loaded yet")]
    SceneNotReady,
    #[error("A VR session request is already in progress")]
    AlreadyPending,
    #[error("VR session is already active")]
    AlreadyActive,
}

/// Current state of the enter-VR control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VrState {
    /// Model not loaded; control hidden
    #[default]
    Hidden,
    /// Control visible and clickable
    Ready,
    /// Session request in flight; control disabled
    Pending,
    /// Session running
    Active,
}

/// Options for an immersive session request
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XrSessionOptions {
    /// Names of meshes that act as the floor
    pub floor_meshes: Vec<String>,
    pub disable_teleportation: bool,
    /// Names of meshes that accept teleports
    pub teleportation_floor_meshes: Vec<String>,
}

impl XrSessionOptions {
    /// Options for a single floor mesh, which is both floor and teleport target
    pub fn with_floor(floor: Option<&str>, disable_teleportation: bool) -> Self {
        let floors: Vec<String> = floor.map(str::to_string).into_iter().collect();
        Self {
            floor_meshes: floors.clone(),
            disable_teleportation,
            teleportation_floor_meshes: floors,
        }
    }

    /// Whether teleportation will be available once the session starts
    pub fn teleportation_enabled(&self) -> bool {
        !self.disable_teleportation && !self.teleportation_floor_meshes.is_empty()
    }

    /// WebXR optional features to request
    pub fn optional_features(&self) -> Vec<&'static str> {
        let mut features = vec!["local-floor"];
        if !self.floor_meshes.is_empty() {
            features.push("bounded-floor");
        }
        features
    }
}

#[derive(Debug, Clone, Default)]
pub struct VrTrigger {
    state: VrState,
}

impl VrTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> VrState {
        self.state
    }

    /// Reveal the control once the scene is ready
    pub fn reveal(&mut self) {
        if self.state == VrState::Hidden {
            self.state = VrState::Ready;
        }
    }

    /// Start a session request
    pub fn begin(&mut self) -> Result<(), VrError> {
        match self.state {
            VrState::Hidden => Err(VrError::SceneNotReady),
            VrState::Pending => Err(VrError::AlreadyPending),
            VrState::Active => Err(VrError::AlreadyActive),
            VrState::Ready => {
                self.state = VrState::Pending;
                Ok(())
            }
        }
    }

    /// The pending request produced a session
    pub fn succeed(&mut self) {
        if self.state == VrState::Pending {
            self.state = VrState::Active;
        }
    }

    /// The pending request failed; allow a manual retry
    pub fn fail(&mut self) {
        if self.state == VrState::Pending {
            self.state = VrState::Ready;
        }
    }

    /// The running session ended
    pub fn end(&mut self) {
        if self.state == VrState::Active {
            self.state = VrState::Ready;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.state != VrState::Hidden
    }

    /// Whether the control accepts clicks
    pub fn is_enabled(&self) -> bool {
        self.state == VrState::Ready
    }

    /// Label shown on the control
    pub fn label(&self) -> &'static str {
        match self.state {
            VrState::Active => "VR active",
            _ => "Enter VR",
        }
    }
}
