//! Tracking Module
//!
//! Camera feed and target tracking:
//! - [`calibration`]: ARToolkit camera parameter file parsing and the
//!   projection matrix derived from it
//! - [`source`]: video source abstraction feeding frames to the detector
//! - [`detector`]: target detection abstraction producing per-anchor poses
//! - [`context`]: the tracking context state machine tying them together

pub mod calibration;
pub mod context;
pub mod detector;
pub mod source;

pub use calibration::CameraCalibration;
pub use context::{DetectionMode, TrackedAnchor, TrackingContext, TrackingState};
pub use detector::{Detection, Detector, ScriptedDetector};
pub use source::{SyntheticSource, VideoFrame, VideoSource};
