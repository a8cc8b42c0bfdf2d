//! Glade Core - Engine-independent viewer logic
//!
//! This crate holds everything in the viewer that does not need a renderer:
//! - Axis-aligned bounding volumes and the camera auto-framer
//! - Mesh role classification (model, floor, utility)
//! - Model load lifecycle tracking with a single terminal outcome
//! - The VR trigger state machine and teleport target selection
//! - Viewer configuration and user-visible status messages

pub mod bounds;
pub mod config;
pub mod error;
pub mod framing;
pub mod loading;
pub mod roles;
pub mod status;
pub mod teleport;
pub mod vr;

pub use bounds::BoundingVolume;
pub use config::{ConfigError, ViewerConfig};
pub use error::ViewerError;
pub use framing::{FrameResult, FramingError, FramingParams, frame, frame_or_fallback, frame_with};
pub use loading::{LoadEvent, LoadOutcome, LoadTracker, SceneSummary};
pub use roles::{MeshRole, classify};
pub use status::{Severity, StatusMessage};
pub use vr::{VrError, VrState, VrTrigger, XrSessionOptions};
