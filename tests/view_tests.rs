//! AR View Tests
//!
//! Drives the per-frame tick with a synthetic video source, a scripted
//! detector and a recording renderer, and checks:
//! - The readiness gate (no rendering before the source delivers a frame
//!   and the tracking context reaches ready)
//! - Anchor visibility following the detection script while rendering
//!   continues every tick, and scene-level visibility in single-marker mode
//! - One mixer registered per spliced model, order independent
//! - Placement applied to the wrapper group, not the model's own nodes
//! - Resize copying the source element size to renderer and tracking

use std::sync::Arc;

use glam::{Quat, Vec3};

use ardent::animation::binding::TargetPath;
use ardent::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use ardent::animation::tracks::{InterpolationMode, KeyframeTrack};
use ardent::assets::{Prefab, PrefabNode, SharedPrefab};
use ardent::errors::Result;
use ardent::{
    ArView, AssetServer, CameraCalibration, DetectionMode, Placement, Scene, SceneRenderer,
    ScriptedDetector, SyntheticSource, TrackingContext, TrackingState,
};

// ============================================================================
// Test Doubles
// ============================================================================

/// Renderer that records the number of visible mesh instances per frame
/// instead of touching a GPU.
#[derive(Default)]
struct RecordingRenderer {
    size: (u32, u32),
    frames: Vec<usize>,
}

impl SceneRenderer for RecordingRenderer {
    fn render(&mut self, scene: &Scene, _assets: &AssetServer) -> Result<()> {
        self.frames.push(scene.visible_mesh_instances().len());
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }
}

fn test_calibration() -> CameraCalibration {
    CameraCalibration {
        xsize: 640,
        ysize: 480,
        matrix: [
            [500.0, 0.0, 320.0, 0.0],
            [0.0, 510.0, 240.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
        dist_factors: vec![0.0; 4],
    }
}

/// View with an already-initialized tracking context so ticks are fully
/// deterministic.
fn ready_view_in_mode(
    detector: ScriptedDetector,
    mode: DetectionMode,
    anchors: usize,
    warmup_polls: u32,
) -> ArView {
    let source = Box::new(SyntheticSource::new(640, 480, warmup_polls));
    let mut tracking = TrackingContext::new(Box::new(detector), mode, anchors, 0.1, 1000.0);
    tracking.init_with_calibration(test_calibration());
    ArView::new(source, tracking, "unused_calibration.dat")
}

fn ready_view(detector: ScriptedDetector, anchors: usize, warmup_polls: u32) -> ArView {
    ready_view_in_mode(detector, DetectionMode::ImageTargets, anchors, warmup_polls)
}

/// Single-node prefab named `Body` carrying the given clips.
fn prefab_with_clips(clips: Vec<AnimationClip>) -> SharedPrefab {
    Arc::new(Prefab {
        nodes: vec![PrefabNode {
            name: Some("Body".to_string()),
            ..PrefabNode::new()
        }],
        root_indices: vec![0],
        animations: clips.into_iter().map(Arc::new).collect(),
    })
}

fn translation_clip(name: &str, end: Vec3) -> AnimationClip {
    AnimationClip::new(
        name.to_string(),
        vec![Track {
            meta: TrackMeta {
                node_name: "Body".to_string(),
                target: TargetPath::Translation,
            },
            data: TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, 1.0],
                vec![Vec3::ZERO, end],
                InterpolationMode::Linear,
            )),
        }],
    )
}

// ============================================================================
// Readiness Gate
// ============================================================================

#[test]
fn no_render_until_source_delivers_a_frame() {
    let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 1, 3);
    let mut renderer = RecordingRenderer::default();

    for _ in 0..3 {
        view.tick(&mut renderer).unwrap();
    }
    assert_eq!(view.rendered_frames(), 0, "Warm-up ticks must not render");
    assert!(renderer.frames.is_empty());

    view.tick(&mut renderer).unwrap();
    assert_eq!(view.rendered_frames(), 1);
    assert_eq!(renderer.frames.len(), 1);
}

#[test]
fn no_render_while_tracking_is_not_ready() {
    // The calibration path is bogus, so tracking never reaches ready and
    // the gate must hold even though the source delivers frames.
    let source = Box::new(SyntheticSource::new(640, 480, 0));
    let tracking = TrackingContext::new(
        Box::new(ScriptedDetector::from_visibility(&[true])),
        DetectionMode::SingleMarker,
        1,
        0.1,
        1000.0,
    );
    let mut view = ArView::new(source, tracking, "/nonexistent/calibration.dat");
    let mut renderer = RecordingRenderer::default();

    for _ in 0..5 {
        view.tick(&mut renderer).unwrap();
        assert_ne!(view.tracking_state(), TrackingState::Ready);
    }
    assert_eq!(view.rendered_frames(), 0, "Gate must block all rendering");
    assert!(renderer.frames.is_empty());

    // Anchors never became visible without a ready context.
    let anchor = view.anchor_node(0).unwrap();
    assert!(!view.scene.get_node(anchor).unwrap().visible);
}

// ============================================================================
// Detection Driving Visibility
// ============================================================================

#[test]
fn anchor_visibility_follows_script_while_rendering_every_tick() {
    let script = [true, true, true, false, false];
    let mut view = ready_view(ScriptedDetector::from_visibility(&script), 1, 0);
    let mut renderer = RecordingRenderer::default();

    // Content under the anchor: a single-node prefab with no animation.
    let mesh_key = view.scene.meshes.insert(ardent::Mesh::new(
        ardent::assets::GeometryHandle::default(),
        ardent::assets::MaterialHandle::default(),
    ));
    let anchor = view.anchor_node(0).unwrap();
    view.scene
        .build_node("Content")
        .with_mesh(mesh_key)
        .with_parent(anchor)
        .build();

    let mut visible_per_tick = Vec::new();
    for _ in 0..script.len() {
        view.tick(&mut renderer).unwrap();
        visible_per_tick.push(view.scene.get_node(anchor).unwrap().visible);
    }

    assert_eq!(visible_per_tick, script);
    assert_eq!(view.rendered_frames(), 5, "Every tick renders");
    assert_eq!(renderer.frames, vec![1, 1, 1, 0, 0]);
}

#[test]
fn single_marker_mode_toggles_scene_visibility() {
    let script = [true, true, true, false, false];
    let mut view = ready_view_in_mode(
        ScriptedDetector::from_visibility(&script),
        DetectionMode::SingleMarker,
        1,
        0,
    );
    let mut renderer = RecordingRenderer::default();

    let mesh_key = view.scene.meshes.insert(ardent::Mesh::new(
        ardent::assets::GeometryHandle::default(),
        ardent::assets::MaterialHandle::default(),
    ));
    let anchor = view.anchor_node(0).unwrap();
    view.scene
        .build_node("Content")
        .with_mesh(mesh_key)
        .with_parent(anchor)
        .build();

    let mut scene_visible_per_tick = Vec::new();
    for _ in 0..script.len() {
        view.tick(&mut renderer).unwrap();
        scene_visible_per_tick.push(view.scene.visible);
    }

    assert_eq!(scene_visible_per_tick, script);
    assert_eq!(view.rendered_frames(), 5, "Rendering never pauses");
    assert_eq!(renderer.frames, vec![1, 1, 1, 0, 0]);
}

#[test]
fn anchor_pose_reaches_node_transform() {
    use ardent::Detection;
    use glam::Affine3A;

    let pose = Affine3A::from_translation(Vec3::new(0.5, 0.0, -2.0));
    let detector = ScriptedDetector::new(vec![vec![Detection {
        anchor_index: 0,
        pose,
        confidence: 1.0,
    }]]);
    let mut view = ready_view(detector, 1, 0);
    let mut renderer = RecordingRenderer::default();

    view.tick(&mut renderer).unwrap();

    let anchor = view.anchor_node(0).unwrap();
    let world = view.scene.get_node(anchor).unwrap().world_matrix();
    let translation: Vec3 = world.translation.into();
    assert!((translation - Vec3::new(0.5, 0.0, -2.0)).length() < 1e-5);
}

// ============================================================================
// Model Splicing and Mixers
// ============================================================================

#[test]
fn each_spliced_model_registers_one_mixer() {
    let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 2, 0);

    let one_clip = prefab_with_clips(vec![translation_clip("a", Vec3::X)]);
    let two_clips = prefab_with_clips(vec![
        translation_clip("b", Vec3::Y),
        translation_clip("c", Vec3::Z),
    ]);

    view.splice_prefab(&one_clip, 0, Placement::default())
        .unwrap();
    view.splice_prefab(&two_clips, 1, Placement::default())
        .unwrap();

    assert_eq!(view.mixers().len(), 2);
    let playing: usize = view.mixers().iter().map(|m| m.playing_action_count()).sum();
    assert_eq!(playing, 3, "All clips start playing");
}

#[test]
fn mixer_count_is_order_independent() {
    let one_clip = prefab_with_clips(vec![translation_clip("a", Vec3::X)]);
    let two_clips = prefab_with_clips(vec![
        translation_clip("b", Vec3::Y),
        translation_clip("c", Vec3::Z),
    ]);

    for order in [[0usize, 1], [1, 0]] {
        let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 2, 0);
        let prefabs: [&SharedPrefab; 2] = [&one_clip, &two_clips];
        for &i in &order {
            view.splice_prefab(prefabs[i], i, Placement::default())
                .unwrap();
        }
        assert_eq!(view.mixers().len(), 2);
        let playing: usize = view.mixers().iter().map(|m| m.playing_action_count()).sum();
        assert_eq!(playing, 3);
    }
}

#[test]
fn placement_lands_on_wrapper_group() {
    let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 1, 0);
    let prefab = prefab_with_clips(vec![]);

    let placement = Placement {
        scale: 0.01,
        offset: Vec3::new(0.0, 1.0, 0.0),
        rotation: Quat::IDENTITY,
    };
    let group = view.splice_prefab(&prefab, 0, placement).unwrap();

    let group_node = view.scene.get_node(group).unwrap();
    assert_eq!(group_node.transform.scale, Vec3::splat(0.01));
    assert_eq!(group_node.transform.position, Vec3::new(0.0, 1.0, 0.0));

    // The model's own node keeps its identity transform.
    let body = view.scene.find_node_by_name(group, "Body").unwrap();
    assert_eq!(view.scene.get_node(body).unwrap().transform.scale, Vec3::ONE);
}

#[test]
fn spliced_subtree_gets_shadow_flags() {
    let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 1, 0);
    let prefab = prefab_with_clips(vec![]);

    let group = view.splice_prefab(&prefab, 0, Placement::default()).unwrap();

    let group_node = view.scene.get_node(group).unwrap();
    assert!(group_node.cast_shadow && group_node.receive_shadow);

    let body = view.scene.find_node_by_name(group, "Body").unwrap();
    let body_node = view.scene.get_node(body).unwrap();
    assert!(body_node.cast_shadow && body_node.receive_shadow);

    // The anchor itself is untouched.
    let anchor = view.anchor_node(0).unwrap();
    let anchor_node = view.scene.get_node(anchor).unwrap();
    assert!(!anchor_node.cast_shadow && !anchor_node.receive_shadow);
}

#[test]
fn spliced_animation_drives_node_through_tick() {
    let mut view = ready_view(ScriptedDetector::from_visibility(&[true]), 1, 0);
    let mut renderer = RecordingRenderer::default();

    let prefab = prefab_with_clips(vec![translation_clip("slide", Vec3::new(4.0, 0.0, 0.0))]);
    let group = view.splice_prefab(&prefab, 0, Placement::default()).unwrap();

    // Ticks use wall-clock dt, so only sample near t=0 is predictable.
    view.tick(&mut renderer).unwrap();

    let body = view.scene.find_node_by_name(group, "Body").unwrap();
    let pos = view.scene.get_node(body).unwrap().transform.position;
    assert!(
        pos.x >= 0.0 && pos.x < 1.0,
        "Expected early-clip sample, got {}",
        pos.x
    );
    assert_eq!(view.mixers()[0].playing_action_count(), 1);
}

#[test]
fn spawn_asset_rejects_unknown_anchor() {
    let view = ready_view(ScriptedDetector::default(), 1, 0);
    assert!(view
        .spawn_asset("model.glb", 3, Placement::default())
        .is_err());
}

// ============================================================================
// Resize
// ============================================================================

#[test]
fn resize_copies_element_size_to_renderer_and_tracking() {
    let source = Box::new(SyntheticSource::new(1234, 777, 0));
    let tracking = TrackingContext::new(
        Box::new(ScriptedDetector::default()),
        DetectionMode::SingleMarker,
        1,
        0.1,
        1000.0,
    );
    let mut view = ArView::new(source, tracking, "unused.dat");
    let mut renderer = RecordingRenderer::default();

    view.resize(&mut renderer);

    assert_eq!(renderer.size(), (1234, 777));
    assert_eq!(view.tracking().processing_size(), (1234, 777));
}

// ============================================================================
// Tracking State Plumbing
// ============================================================================

#[test]
fn ready_view_reports_ready_state() {
    let view = ready_view(ScriptedDetector::default(), 1, 0);
    assert_eq!(view.tracking_state(), TrackingState::Ready);
}
