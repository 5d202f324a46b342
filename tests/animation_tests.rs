//! Animation System Tests
//!
//! Tests for:
//! - KeyframeTrack linear/step/cubic interpolation
//! - KeyframeCursor sequential sampling vs binary search
//! - AnimationAction loop modes (Once, Loop, PingPong)
//! - AnimationClip duration auto-computation
//! - Binder + AnimationMixer writing sampled values into node transforms

use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::{Quat, Vec3};

use ardent::animation::action::{AnimationAction, LoopMode};
use ardent::animation::binding::TargetPath;
use ardent::animation::clip::{AnimationClip, Track, TrackData, TrackMeta};
use ardent::animation::tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
use ardent::animation::{AnimationMixer, Binder};
use ardent::scene::{Node, Scene};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_track(times: Vec<f32>, values: Vec<Vec3>) -> Track {
    Track {
        meta: TrackMeta {
            node_name: "Bone".to_string(),
            target: TargetPath::Translation,
        },
        data: TrackData::Vector3(KeyframeTrack::new(times, values, InterpolationMode::Linear)),
    }
}

// ============================================================================
// KeyframeTrack: Linear Interpolation
// ============================================================================

#[test]
fn track_linear_f32_midpoint() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 10.0],
        InterpolationMode::Linear,
    );
    let val = track.sample(0.5);
    assert!(approx(val, 5.0), "Expected 5.0, got {val}");
}

#[test]
fn track_linear_exact_keyframes() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0_f32, 10.0, 20.0],
        InterpolationMode::Linear,
    );
    assert!(approx(track.sample(0.0), 0.0));
    assert!(approx(track.sample(1.0), 10.0));
    assert!(approx(track.sample(2.0), 20.0));
}

#[test]
fn track_clamps_outside_range() {
    let track = KeyframeTrack::new(
        vec![1.0, 2.0],
        vec![5.0_f32, 15.0],
        InterpolationMode::Linear,
    );
    // Before the first keyframe: first value. After the last: final value.
    assert!(approx(track.sample(0.0), 5.0));
    assert!(approx(track.sample(10.0), 15.0));
}

#[test]
fn track_quat_linear_is_slerp() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![Quat::IDENTITY, Quat::from_rotation_z(FRAC_PI_2)],
        InterpolationMode::Linear,
    );
    let q = track.sample(0.5);
    let expected = Quat::from_rotation_z(FRAC_PI_2 / 2.0);
    assert!(
        q.angle_between(expected) < 1e-4,
        "Expected 45 degree rotation, got {q:?}"
    );
}

// ============================================================================
// KeyframeTrack: Step and CubicSpline
// ============================================================================

#[test]
fn track_step_holds_previous_value() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0],
        vec![1.0_f32, 2.0, 3.0],
        InterpolationMode::Step,
    );
    assert!(approx(track.sample(0.99), 1.0));
    assert!(approx(track.sample(1.0), 2.0));
    assert!(approx(track.sample(1.5), 2.0));
}

#[test]
fn track_cubic_passes_through_keyframes() {
    // CubicSpline layout per keyframe: in-tangent, value, out-tangent.
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 2.0, 0.0, 0.0, 8.0, 0.0],
        InterpolationMode::CubicSpline,
    );
    assert!(approx(track.sample(0.0), 2.0));
    assert!(approx(track.sample(1.0), 8.0));
}

#[test]
fn track_cubic_zero_tangents_midpoint_is_average() {
    // With zero tangents the Hermite basis reduces to h00 + h01 blending,
    // which at t = 0.5 is the plain average of the endpoints.
    let track = KeyframeTrack::new(
        vec![0.0, 1.0],
        vec![0.0_f32, 2.0, 0.0, 0.0, 8.0, 0.0],
        InterpolationMode::CubicSpline,
    );
    assert!(approx(track.sample(0.5), 5.0));
}

// ============================================================================
// KeyframeCursor
// ============================================================================

#[test]
fn cursor_sequential_matches_binary_search() {
    let times: Vec<f32> = (0..50).map(|i| i as f32 * 0.1).collect();
    let values: Vec<f32> = (0..50).map(|i| i as f32).collect();
    let track = KeyframeTrack::new(times, values, InterpolationMode::Linear);

    let mut cursor = KeyframeCursor::default();
    for i in 0..200 {
        let t = i as f32 * 0.025;
        let seq = track.sample_with_cursor(t, &mut cursor);
        let bin = track.sample(t);
        assert!(approx(seq, bin), "Mismatch at t={t}: {seq} vs {bin}");
    }
}

#[test]
fn cursor_survives_backward_jump() {
    let track = KeyframeTrack::new(
        vec![0.0, 1.0, 2.0, 3.0, 4.0],
        vec![0.0_f32, 10.0, 20.0, 30.0, 40.0],
        InterpolationMode::Linear,
    );

    let mut cursor = KeyframeCursor::default();
    assert!(approx(track.sample_with_cursor(3.5, &mut cursor), 35.0));
    // Loop wrap: jump back to the start.
    assert!(approx(track.sample_with_cursor(0.5, &mut cursor), 5.0));
}

// ============================================================================
// AnimationClip
// ============================================================================

#[test]
fn clip_duration_is_latest_keyframe_across_tracks() {
    let clip = AnimationClip::new(
        "walk".to_string(),
        vec![
            vec3_track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::ONE]),
            vec3_track(vec![0.0, 2.5], vec![Vec3::ZERO, Vec3::ONE]),
        ],
    );
    assert!(approx(clip.duration, 2.5));
}

// ============================================================================
// AnimationAction: Loop Modes
// ============================================================================

fn one_second_action(loop_mode: LoopMode) -> AnimationAction {
    let clip = Arc::new(AnimationClip::new(
        "clip".to_string(),
        vec![vec3_track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::ONE])],
    ));
    let mut action = AnimationAction::new(clip);
    action.loop_mode = loop_mode;
    action.play();
    action
}

#[test]
fn action_once_pauses_at_end() {
    let mut action = one_second_action(LoopMode::Once);
    action.update(0.7);
    assert!(action.is_playing());

    action.update(0.7);
    assert!(approx(action.time, 1.0), "Expected clamp, got {}", action.time);
    assert!(!action.is_playing());
}

#[test]
fn action_loop_wraps() {
    let mut action = one_second_action(LoopMode::Loop);
    action.update(1.25);
    assert!(approx(action.time, 0.25), "Expected wrap, got {}", action.time);
    assert!(action.is_playing());
}

#[test]
fn action_ping_pong_reflects_and_reverses() {
    let mut action = one_second_action(LoopMode::PingPong);
    action.update(0.6);
    assert!(approx(action.time, 0.6));

    // Crosses the end: reflect back and reverse direction.
    action.update(0.6);
    assert!(approx(action.time, 0.8), "Expected 0.8, got {}", action.time);
    assert!(action.time_scale < 0.0);

    action.update(0.6);
    assert!(approx(action.time, 0.2), "Expected 0.2, got {}", action.time);
}

#[test]
fn action_play_restarts_from_zero() {
    let mut action = one_second_action(LoopMode::Once);
    action.update(2.0);
    assert!(!action.is_playing());

    action.play();
    assert!(approx(action.time, 0.0));
    assert!(action.is_playing());
}

// ============================================================================
// Binder + AnimationMixer
// ============================================================================

#[test]
fn mixer_writes_sampled_translation_into_bound_node() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Root"));
    let bone = scene.add_to_parent(Node::new("Bone"), root);

    let clip = Arc::new(AnimationClip::new(
        "slide".to_string(),
        vec![vec3_track(
            vec![0.0, 1.0],
            vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
        )],
    ));

    let mut action = AnimationAction::new(clip.clone());
    action.bindings = Binder::bind(&scene, root, &clip);
    assert_eq!(action.bindings.len(), 1, "Track should resolve to Bone");
    action.play();

    let mut mixer = AnimationMixer::new();
    mixer.add_action(action);
    mixer.update(0.5, &mut scene);

    let pos = scene.get_node(bone).unwrap().transform.position;
    assert!(approx(pos.x, 2.0), "Expected x=2.0, got {}", pos.x);
}

#[test]
fn binder_skips_unresolvable_tracks() {
    let mut scene = Scene::new();
    let root = scene.add_node(Node::new("Root"));

    let clip = AnimationClip::new(
        "orphan".to_string(),
        vec![vec3_track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::ONE])],
    );

    // No node named "Bone" anywhere under root.
    let bindings = Binder::bind(&scene, root, &clip);
    assert!(bindings.is_empty());
}

#[test]
fn mixer_counts_playing_actions() {
    let mut mixer = AnimationMixer::new();

    let mut playing = one_second_action(LoopMode::Loop);
    playing.play();
    mixer.add_action(playing);

    let mut paused = one_second_action(LoopMode::Loop);
    paused.paused = true;
    mixer.add_action(paused);

    assert_eq!(mixer.actions().len(), 2);
    assert_eq!(mixer.playing_action_count(), 1);
}

#[test]
fn mixer_plays_actions_by_clip_name() {
    let mut mixer = AnimationMixer::new();

    let walk = Arc::new(AnimationClip::new(
        "walk".to_string(),
        vec![vec3_track(vec![0.0, 1.0], vec![Vec3::ZERO, Vec3::X])],
    ));
    let mut action = AnimationAction::new(walk);
    action.paused = true;
    mixer.add_action(action);

    assert_eq!(mixer.list_animations().collect::<Vec<_>>(), ["walk"]);
    assert_eq!(mixer.playing_action_count(), 0);

    assert!(mixer.play("walk"));
    assert_eq!(mixer.playing_action_count(), 1);

    assert!(!mixer.play("run"), "Unknown clip names are reported");
}
