//! Tracking Context Tests
//!
//! Tests for:
//! - Async calibration loading end to end (file read, parse, Ready)
//! - Failed calibration loads reverting to Uninitialized without retry
//! - Initialization idempotence
//! - Multi-anchor detection with independent visibility and poses

use std::path::PathBuf;
use std::thread::sleep;
use std::time::Duration;

use glam::{Affine3A, Vec3};

use ardent::{
    CameraCalibration, Detection, DetectionMode, ScriptedDetector, TrackingContext, TrackingState,
    VideoFrame,
};

fn calibration_bytes(xsize: i32, ysize: i32, fx: f64, fy: f64) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&xsize.to_be_bytes());
    bytes.extend_from_slice(&ysize.to_be_bytes());
    let matrix: [[f64; 4]; 3] = [
        [fx, 0.0, xsize as f64 / 2.0, 0.0],
        [0.0, fy, ysize as f64 / 2.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
    ];
    for row in &matrix {
        for v in row {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
    }
    for d in [0.0f64; 4] {
        bytes.extend_from_slice(&d.to_be_bytes());
    }
    bytes
}

fn test_calibration() -> CameraCalibration {
    CameraCalibration::parse(&calibration_bytes(640, 480, 500.0, 510.0)).unwrap()
}

fn frame(sequence: u64) -> VideoFrame {
    VideoFrame {
        width: 640,
        height: 480,
        luma: std::sync::Arc::new(vec![0x80; 640 * 480]),
        sequence,
    }
}

/// Polls `poll_init` until the context leaves `Initializing` or the timeout
/// expires.
fn poll_until_settled(ctx: &mut TrackingContext) {
    for _ in 0..500 {
        ctx.poll_init();
        if ctx.state() != TrackingState::Initializing {
            return;
        }
        sleep(Duration::from_millis(10));
    }
}

fn temp_calibration_file(tag: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("ardent_calib_{tag}_{}.dat", std::process::id()));
    std::fs::write(&path, calibration_bytes(640, 480, 500.0, 510.0)).unwrap();
    path
}

// ============================================================================
// Initialization Lifecycle
// ============================================================================

#[test]
fn async_init_reaches_ready() {
    let path = temp_calibration_file("ok");

    let detector = ScriptedDetector::from_visibility(&[true]);
    let mut ctx = TrackingContext::new(
        Box::new(detector),
        DetectionMode::SingleMarker,
        1,
        0.1,
        1000.0,
    );
    assert_eq!(ctx.state(), TrackingState::Uninitialized);

    ctx.begin_init(&path);
    assert_eq!(ctx.state(), TrackingState::Initializing);

    poll_until_settled(&mut ctx);
    std::fs::remove_file(&path).ok();

    assert_eq!(ctx.state(), TrackingState::Ready);
    assert!(ctx.projection_matrix().is_some());
    assert_eq!(ctx.processing_size(), (640, 480));
}

#[test]
fn failed_init_reverts_to_uninitialized() {
    let detector = ScriptedDetector::default();
    let mut ctx = TrackingContext::new(
        Box::new(detector),
        DetectionMode::SingleMarker,
        1,
        0.1,
        1000.0,
    );

    ctx.begin_init("/nonexistent/ardent_missing_calibration.dat");
    poll_until_settled(&mut ctx);

    assert_eq!(ctx.state(), TrackingState::Uninitialized);
    assert!(ctx.projection_matrix().is_none());

    // No retry happens on its own; updates stay inert.
    ctx.update(&frame(1));
    assert!(!ctx.anchor(0).unwrap().visible);
}

#[test]
fn begin_init_is_idempotent_once_ready() {
    let detector = ScriptedDetector::default();
    let mut ctx = TrackingContext::new(
        Box::new(detector),
        DetectionMode::SingleMarker,
        1,
        0.1,
        1000.0,
    );
    ctx.init_with_calibration(test_calibration());
    assert_eq!(ctx.state(), TrackingState::Ready);

    ctx.begin_init("/nonexistent/ignored.dat");
    assert_eq!(ctx.state(), TrackingState::Ready);
}

// ============================================================================
// Multi-Anchor Detection
// ============================================================================

#[test]
fn anchors_track_independently() {
    let pose_a = Affine3A::from_translation(Vec3::new(-1.0, 0.0, -3.0));
    let pose_b = Affine3A::from_translation(Vec3::new(1.0, 0.0, -4.0));

    let script = vec![
        // Frame 1: both targets in view.
        vec![
            Detection {
                anchor_index: 0,
                pose: pose_a,
                confidence: 1.0,
            },
            Detection {
                anchor_index: 1,
                pose: pose_b,
                confidence: 1.0,
            },
        ],
        // Frame 2: only the second target.
        vec![Detection {
            anchor_index: 1,
            pose: pose_b,
            confidence: 1.0,
        }],
    ];

    let mut ctx = TrackingContext::new(
        Box::new(ScriptedDetector::new(script)),
        DetectionMode::ImageTargets,
        2,
        0.1,
        1000.0,
    );
    ctx.init_with_calibration(test_calibration());

    ctx.update(&frame(1));
    assert!(ctx.anchor(0).unwrap().visible);
    assert!(ctx.anchor(1).unwrap().visible);
    assert_eq!(ctx.anchor(0).unwrap().pose, pose_a);

    ctx.update(&frame(2));
    assert!(!ctx.anchor(0).unwrap().visible);
    assert!(ctx.anchor(1).unwrap().visible);
    assert_eq!(ctx.anchor(1).unwrap().pose, pose_b);
}
