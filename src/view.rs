//! AR View
//!
//! [`ArView`] owns everything one AR overlay needs: the scene graph, the
//! tracking context, the video source, anchor nodes and the animation mixer
//! list. Its [`tick`](ArView::tick) method is the per-frame driver, called
//! once per redraw from the windowing loop.
//!
//! All mutation happens on the caller's thread. Background tasks only read
//! bytes and decode; their results arrive over a channel and are spliced
//! into the scene at the start of the next tick, so no lock guards scene
//! state.

use std::path::PathBuf;

use glam::{Quat, Vec3};

use crate::animation::{AnimationAction, AnimationMixer, Binder};
use crate::ar::context::{DetectionMode, TrackingContext, TrackingState};
use crate::ar::source::VideoSource;
use crate::assets::prefab::SharedPrefab;
use crate::assets::server::get_asset_runtime;
use crate::assets::AssetServer;
use crate::errors::{ArdentError, Result};
use crate::renderer::SceneRenderer;
use crate::scene::{Camera, Node, NodeHandle, Scene};
use crate::utils::Timer;

/// How a loaded model sits relative to its anchor.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub scale: f32,
    pub offset: Vec3,
    pub rotation: Quat,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

struct LoadMessage {
    anchor_index: usize,
    placement: Placement,
    label: String,
    result: Result<SharedPrefab>,
}

/// The per-window AR driver.
pub struct ArView {
    pub scene: Scene,
    pub assets: AssetServer,

    tracking: TrackingContext,
    source: Box<dyn VideoSource>,
    calibration_path: PathBuf,

    camera_node: NodeHandle,
    anchor_nodes: Vec<NodeHandle>,

    /// Append-only; one mixer per completed model load.
    mixers: Vec<AnimationMixer>,

    timer: Timer,
    load_tx: flume::Sender<LoadMessage>,
    load_rx: flume::Receiver<LoadMessage>,

    init_started: bool,
    projection_applied: bool,
    rendered_frames: u64,
}

impl ArView {
    /// Assembles the scene skeleton: a camera at the origin and one hidden
    /// group node per anchor. Anchor groups stay invisible until their
    /// target is first detected.
    pub fn new(
        source: Box<dyn VideoSource>,
        tracking: TrackingContext,
        calibration_path: impl Into<PathBuf>,
    ) -> Self {
        let mut scene = Scene::new();

        // Placeholder projection, replaced by the calibration-derived one
        // when tracking becomes ready.
        let camera = Camera::new_perspective(45.0, 4.0 / 3.0, 0.1, 1000.0);
        let camera_node = scene.add_camera(camera);
        scene.active_camera = Some(camera_node);

        let anchor_nodes: Vec<NodeHandle> = (0..tracking.anchor_count())
            .map(|i| {
                let mut node = Node::new(&format!("Anchor_{i}"));
                node.visible = false;
                scene.add_node(node)
            })
            .collect();

        let (load_tx, load_rx) = flume::unbounded();

        Self {
            scene,
            assets: AssetServer::new(),
            tracking,
            source,
            calibration_path: calibration_path.into(),
            camera_node,
            anchor_nodes,
            mixers: Vec::new(),
            timer: Timer::new(),
            load_tx,
            load_rx,
            init_started: false,
            projection_applied: false,
            rendered_frames: 0,
        }
    }

    #[must_use]
    pub fn camera_node(&self) -> NodeHandle {
        self.camera_node
    }

    pub fn anchor_node(&self, index: usize) -> Result<NodeHandle> {
        self.anchor_nodes
            .get(index)
            .copied()
            .ok_or(ArdentError::AnchorIndexOutOfBounds {
                index,
                count: self.anchor_nodes.len(),
            })
    }

    #[must_use]
    pub fn tracking_state(&self) -> TrackingState {
        self.tracking.state()
    }

    #[must_use]
    pub fn tracking(&self) -> &TrackingContext {
        &self.tracking
    }

    #[must_use]
    pub fn mixers(&self) -> &[AnimationMixer] {
        &self.mixers
    }

    #[must_use]
    pub fn rendered_frames(&self) -> u64 {
        self.rendered_frames
    }

    /// Starts an async model load targeting an anchor.
    ///
    /// File read and glTF decode run on the asset runtime; the decoded
    /// prefab is spliced under the anchor at the start of a later tick.
    /// A failed load is logged when its result arrives and the anchor
    /// keeps whatever content it already has; there is no retry.
    pub fn spawn_asset(
        &self,
        path: impl Into<PathBuf>,
        anchor_index: usize,
        placement: Placement,
    ) -> Result<()> {
        if anchor_index >= self.anchor_nodes.len() {
            return Err(ArdentError::AnchorIndexOutOfBounds {
                index: anchor_index,
                count: self.anchor_nodes.len(),
            });
        }

        let path: PathBuf = path.into();
        let label = path.display().to_string();
        let assets = self.assets.clone();
        let tx = self.load_tx.clone();

        get_asset_runtime().spawn(async move {
            let result = assets.load_prefab_async(&path).await;
            // Receiver gone means the view was dropped mid-load.
            let _ = tx.send(LoadMessage {
                anchor_index,
                placement,
                label,
                result,
            });
        });

        Ok(())
    }

    /// Splices an already-decoded prefab under an anchor, creating and
    /// registering its animation mixer. Used by the load pipeline and
    /// directly by tests.
    pub fn splice_prefab(
        &mut self,
        prefab: &SharedPrefab,
        anchor_index: usize,
        placement: Placement,
    ) -> Result<NodeHandle> {
        let anchor = self.anchor_node(anchor_index)?;

        let group = prefab.instantiate(&mut self.scene, anchor);
        if let Some(node) = self.scene.get_node_mut(group) {
            node.transform.scale = Vec3::splat(placement.scale);
            node.transform.position = placement.offset;
            node.transform.rotation = placement.rotation;
        }
        self.scene.set_subtree_shadow_flags(group, true, true);

        let mut mixer = AnimationMixer::new();
        for clip in &prefab.animations {
            let mut action = AnimationAction::new(clip.clone());
            action.bindings = Binder::bind(&self.scene, group, clip);
            action.play();
            mixer.add_action(action);
        }
        self.mixers.push(mixer);

        Ok(group)
    }

    fn drain_completed_loads(&mut self) {
        while let Ok(message) = self.load_rx.try_recv() {
            match message.result {
                Ok(prefab) => {
                    log::info!(
                        "Model '{}' ready, splicing into anchor {}",
                        message.label,
                        message.anchor_index
                    );
                    if let Err(e) =
                        self.splice_prefab(&prefab, message.anchor_index, message.placement)
                    {
                        log::error!("Failed to splice '{}': {e}", message.label);
                    }
                }
                Err(e) => {
                    log::error!("Failed to load model '{}': {e}", message.label);
                }
            }
        }
    }

    /// Runs one frame.
    ///
    /// Order matters and is fixed: completed loads splice first so a model
    /// finishing this tick animates and renders this tick; then tracking
    /// initialization is driven forward; once tracking is ready, detection
    /// results update anchor poses and visibility; finally time advances,
    /// mixers write transforms, world matrices update once and the frame
    /// draws. Until the source delivers a frame and the tracking context
    /// reaches ready, the tick returns without doing any of that.
    pub fn tick(&mut self, renderer: &mut dyn SceneRenderer) -> Result<()> {
        self.drain_completed_loads();

        // Readiness gate: no frame, no work.
        let Some(frame) = self.source.latest_frame() else {
            return Ok(());
        };

        // Initialization starts on the first delivered frame and is never
        // retried after a failure.
        if !self.init_started && self.tracking.state() == TrackingState::Uninitialized {
            self.tracking.begin_init(self.calibration_path.clone());
            self.init_started = true;
        }
        self.tracking.poll_init();

        // Second half of the readiness gate: until tracking is ready no
        // time passes, no mixer advances and nothing renders.
        if !self.tracking.is_ready() {
            return Ok(());
        }

        if !self.projection_applied {
            if let Some(projection) = self.tracking.projection_matrix() {
                if let Some((_, camera)) = self.scene.query_camera_bundle(self.camera_node) {
                    camera.set_custom_projection(projection);
                }
                self.projection_applied = true;
            }
        }

        self.tracking.update(&frame);

        for (index, &anchor_node) in self.anchor_nodes.iter().enumerate() {
            let anchor = self.tracking.anchor(index)?;
            let visible = anchor.visible;
            let pose = anchor.pose;
            if let Some(node) = self.scene.get_node_mut(anchor_node) {
                node.visible = visible;
                if visible {
                    node.transform.apply_local_matrix(pose);
                }
            }
        }

        // Single-marker demos hide the whole scene when the marker is
        // lost; image-target scenes stay up with per-anchor visibility.
        if self.tracking.mode() == DetectionMode::SingleMarker {
            self.scene.visible = self.tracking.anchor(0)?.visible;
        }

        self.timer.tick();
        let dt = self.timer.dt_seconds();

        // Mixers advance every rendered tick, visible or not, so content
        // that reappears shows the animation at its wall-clock position.
        for mixer in &mut self.mixers {
            mixer.update(dt, &mut self.scene);
        }

        self.scene.update_matrix_world();

        renderer.render(&self.scene, &self.assets)?;
        self.rendered_frames += 1;

        Ok(())
    }

    /// Resize handling: the render target and the detector's processing
    /// size both follow the source's native element size. Window geometry
    /// never reaches tracking.
    pub fn resize(&mut self, renderer: &mut dyn SceneRenderer) {
        let (width, height) = self.source.element_size();
        renderer.resize(width, height);
        self.tracking.set_processing_size(width, height);
    }
}
