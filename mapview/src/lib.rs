//! Interactive world map viewport core.
//!
//! - [`camera`]: flight state machine and free orbit/pan/zoom
//! - [`frame`]: per-frame scheduling of flight continuations
//! - [`selection`]: selected tile and entity carousel
//! - [`gesture`]: scoped subscriptions for viewport-wide gestures
//! - [`scene`]: the render-surface seam
//! - [`viewport`]: composition of all of the above

pub mod args;
pub mod camera;
pub mod config;
pub mod details;
pub mod frame;
pub mod gesture;
pub mod scene;
pub mod script;
pub mod selection;
pub mod viewport;

pub use camera::{
    CameraBusy, CameraController, CameraPhase, CameraPose, CameraSettings, FlightToken,
    ResetOutcome, ResetPolicy, StepOutcome,
};
pub use config::{ConfigError, ViewerConfig};
pub use frame::FrameScheduler;
pub use gesture::{Gesture, GestureHub, GestureSubscription};
pub use scene::{RenderSurface, SceneBuffer};
pub use selection::SelectionState;
pub use viewport::ViewportOrchestrator;
