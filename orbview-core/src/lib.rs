//! orbview core library - animation, geometry and asset loading
//!
//! This library provides the renderer-independent pieces of the model viewer:
//! the per-frame animator, procedural geometry, camera and orbit controls,
//! the light rig, the GLB/STL loaders and the viewer configuration.

pub mod animator;
pub mod clock;
pub mod config;
pub mod controls;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod glb;
pub mod lighting;
pub mod loader;
pub mod projection;
pub mod scene;
pub mod stl;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use animator::{AnimatorConfig, Frame, FrameAnimator, PointerOffset, SatelliteState};
pub use config::ViewerConfig;
pub use controls::{ControlsConfig, OrbitControls};
pub use error::{ConfigError, LoadError};
pub use geometry::{Mesh, Triangle, Vertex};
pub use lighting::{Lighting, Material};
pub use projection::Camera;
pub use scene::Scene;
pub use transform::{ObjectTransform, RotationState, Transform};
pub use viewer::Viewer;
