#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod app;
pub mod ar;
pub mod assets;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod utils;
pub mod view;

pub use animation::{AnimationAction, AnimationClip, AnimationMixer, Binder, LoopMode};
pub use ar::{
    CameraCalibration, Detection, DetectionMode, Detector, ScriptedDetector, SyntheticSource,
    TrackingContext, TrackingState, VideoFrame, VideoSource,
};
pub use assets::{AssetServer, Prefab, SharedPrefab};
pub use app::App;
pub use errors::ArdentError;
pub use renderer::{ForwardRenderer, RendererSettings, SceneRenderer, WgpuContext};
pub use resources::primitives::*;
pub use resources::{Geometry, Material, Mesh};
pub use scene::{Camera, Light, Node, Scene};
pub use view::{ArView, Placement};
