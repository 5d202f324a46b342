use std::path::PathBuf;

use glam::{Affine3A, Mat4};

use crate::ar::calibration::CameraCalibration;
use crate::ar::detector::{Detection, Detector};
use crate::ar::source::VideoFrame;
use crate::assets::server::get_asset_runtime;
use crate::errors::{ArdentError, Result};

/// Lifecycle of the tracking context.
///
/// `Uninitialized` until the video source delivers its first frame,
/// `Initializing` while calibration data loads and parses on the asset
/// runtime, `Ready` once the projection matrix is available. Tracking and
/// rendering of anchored content only happen in `Ready`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Uninitialized,
    Initializing,
    Ready,
}

/// What kind of target the detector looks for, and how detection results
/// propagate into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// One fiducial marker. Its visibility also drives the scene-level
    /// visibility flag, hiding everything when the marker is lost.
    SingleMarker,
    /// One or more natural-image targets with independent per-anchor
    /// visibility. Scene-level visibility is left alone.
    ImageTargets,
}

/// Per-anchor tracking output, refreshed every processed frame.
#[derive(Debug, Clone)]
pub struct TrackedAnchor {
    /// Whether the target was detected in the latest processed frame
    pub visible: bool,
    /// Camera-space pose from the latest detection
    pub pose: Affine3A,
}

impl Default for TrackedAnchor {
    fn default() -> Self {
        Self {
            visible: false,
            pose: Affine3A::IDENTITY,
        }
    }
}

/// Ties calibration, detection and per-anchor state together.
pub struct TrackingContext {
    state: TrackingState,
    mode: DetectionMode,
    detector: Box<dyn Detector>,
    anchors: Vec<TrackedAnchor>,

    calibration: Option<CameraCalibration>,
    projection: Option<Mat4>,
    near: f32,
    far: f32,

    calib_rx: Option<flume::Receiver<Result<CameraCalibration>>>,

    /// Size the detector processes at, kept in sync with the source
    /// element size by resize handling.
    processing_size: (u32, u32),
}

impl TrackingContext {
    #[must_use]
    pub fn new(
        detector: Box<dyn Detector>,
        mode: DetectionMode,
        anchor_count: usize,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            state: TrackingState::Uninitialized,
            mode,
            detector,
            anchors: vec![TrackedAnchor::default(); anchor_count],
            calibration: None,
            projection: None,
            near,
            far,
            calib_rx: None,
            processing_size: (0, 0),
        }
    }

    #[must_use]
    pub fn state(&self) -> TrackingState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> DetectionMode {
        self.mode
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == TrackingState::Ready
    }

    #[must_use]
    pub fn anchor_count(&self) -> usize {
        self.anchors.len()
    }

    pub fn anchor(&self, index: usize) -> Result<&TrackedAnchor> {
        self.anchors
            .get(index)
            .ok_or(ArdentError::AnchorIndexOutOfBounds {
                index,
                count: self.anchors.len(),
            })
    }

    /// Projection matrix derived from calibration, available once ready.
    #[must_use]
    pub fn projection_matrix(&self) -> Option<Mat4> {
        self.projection
    }

    #[must_use]
    pub fn calibration(&self) -> Option<&CameraCalibration> {
        self.calibration.as_ref()
    }

    #[must_use]
    pub fn processing_size(&self) -> (u32, u32) {
        self.processing_size
    }

    /// Resize handling copies the source element size here so the detector
    /// keeps processing at the native feed resolution.
    pub fn set_processing_size(&mut self, width: u32, height: u32) {
        self.processing_size = (width, height);
    }

    /// Kicks off async calibration loading. Only the first call from
    /// `Uninitialized` does anything; the render loop keeps calling this
    /// every tick once the source is ready and later ticks are no-ops.
    pub fn begin_init(&mut self, calibration_path: impl Into<PathBuf>) {
        if self.state != TrackingState::Uninitialized {
            return;
        }

        let path: PathBuf = calibration_path.into();
        log::info!("Loading camera calibration from {}", path.display());

        let (tx, rx) = flume::bounded(1);
        self.calib_rx = Some(rx);
        self.state = TrackingState::Initializing;

        get_asset_runtime().spawn(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => CameraCalibration::parse(&bytes),
                Err(e) => Err(ArdentError::CalibrationError(format!(
                    "{}: {e}",
                    path.display()
                ))),
            };
            // Receiver dropped means the context went away; nothing to do.
            let _ = tx.send(result);
        });
    }

    /// Synchronous initialization with already-parsed calibration data.
    pub fn init_with_calibration(&mut self, calibration: CameraCalibration) {
        self.projection = Some(calibration.projection_matrix(self.near, self.far));
        self.processing_size = (calibration.xsize, calibration.ysize);
        self.calibration = Some(calibration);
        self.calib_rx = None;
        self.state = TrackingState::Ready;
    }

    /// Polls the in-flight calibration load. Called once per tick while
    /// `Initializing`. A failed load is logged and the context returns to
    /// `Uninitialized`; there is no automatic retry.
    pub fn poll_init(&mut self) {
        if self.state != TrackingState::Initializing {
            return;
        }

        let Some(rx) = &self.calib_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(Ok(calibration)) => {
                log::info!(
                    "Camera calibration ready: {}x{}",
                    calibration.xsize,
                    calibration.ysize
                );
                self.init_with_calibration(calibration);
            }
            Ok(Err(e)) => {
                log::error!("Camera calibration failed to load: {e}");
                self.calib_rx = None;
                self.state = TrackingState::Uninitialized;
            }
            Err(flume::TryRecvError::Empty) => {}
            Err(flume::TryRecvError::Disconnected) => {
                log::error!("Calibration loader task dropped without a result");
                self.calib_rx = None;
                self.state = TrackingState::Uninitialized;
            }
        }
    }

    /// Processes one frame: runs the detector and rewrites every anchor's
    /// visibility and pose. An anchor absent from the detections is hidden;
    /// the latest frame's result always wins.
    pub fn update(&mut self, frame: &VideoFrame) {
        if self.state != TrackingState::Ready {
            return;
        }

        let detections: Vec<Detection> = self.detector.detect(frame);

        for anchor in &mut self.anchors {
            anchor.visible = false;
        }

        for detection in detections {
            match self.anchors.get_mut(detection.anchor_index) {
                Some(anchor) => {
                    anchor.visible = true;
                    anchor.pose = detection.pose;
                }
                None => {
                    log::warn!(
                        "Detection for unknown anchor index {} ignored",
                        detection.anchor_index
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::detector::ScriptedDetector;
    use std::sync::Arc;

    fn frame() -> VideoFrame {
        VideoFrame {
            width: 640,
            height: 480,
            luma: Arc::new(vec![0; 640 * 480]),
            sequence: 1,
        }
    }

    fn ready_context(detector: ScriptedDetector, anchors: usize) -> TrackingContext {
        let mut ctx = TrackingContext::new(
            Box::new(detector),
            DetectionMode::ImageTargets,
            anchors,
            0.1,
            1000.0,
        );
        ctx.init_with_calibration(CameraCalibration {
            xsize: 640,
            ysize: 480,
            matrix: [
                [500.0, 0.0, 320.0, 0.0],
                [0.0, 500.0, 240.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
            ],
            dist_factors: vec![0.0; 4],
        });
        ctx
    }

    #[test]
    fn update_is_inert_before_ready() {
        let detector = ScriptedDetector::from_visibility(&[true]);
        let mut ctx = TrackingContext::new(
            Box::new(detector),
            DetectionMode::SingleMarker,
            1,
            0.1,
            1000.0,
        );

        ctx.update(&frame());
        assert!(!ctx.anchor(0).unwrap().visible);
        assert_eq!(ctx.state(), TrackingState::Uninitialized);
    }

    #[test]
    fn latest_frame_wins_on_visibility() {
        let detector = ScriptedDetector::from_visibility(&[true, false, true]);
        let mut ctx = ready_context(detector, 1);

        ctx.update(&frame());
        assert!(ctx.anchor(0).unwrap().visible);

        ctx.update(&frame());
        assert!(!ctx.anchor(0).unwrap().visible);

        ctx.update(&frame());
        assert!(ctx.anchor(0).unwrap().visible);
    }

    #[test]
    fn unknown_anchor_detection_is_ignored() {
        let detector = ScriptedDetector::new(vec![vec![Detection {
            anchor_index: 5,
            pose: Affine3A::IDENTITY,
            confidence: 1.0,
        }]]);
        let mut ctx = ready_context(detector, 1);

        ctx.update(&frame());
        assert!(!ctx.anchor(0).unwrap().visible);
    }

    #[test]
    fn anchor_index_out_of_bounds_is_an_error() {
        let detector = ScriptedDetector::default();
        let ctx = ready_context(detector, 2);

        assert!(ctx.anchor(1).is_ok());
        assert!(matches!(
            ctx.anchor(2),
            Err(ArdentError::AnchorIndexOutOfBounds { index: 2, count: 2 })
        ));
    }
}
