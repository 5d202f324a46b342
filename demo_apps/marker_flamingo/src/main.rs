//! Marker Flamingo Demo
//!
//! Overlays an animated flamingo model on a single tracked marker. While the
//! model decodes, a translucent slab marks the tracked surface. The video
//! source and detector here are the built-in synthetic ones; swap in real
//! implementations of `VideoSource` and `Detector` to track a live feed.

use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};

use ardent::app::{App, AppHandler, Window};
use ardent::utils::FpsCounter;
use ardent::{
    create_box, ArView, DetectionMode, Light, Material, Mesh, Placement, ScriptedDetector,
    SyntheticSource, TrackingContext,
};

const CALIBRATION: &str = "demo_apps/assets/camera_para.dat";
const MODEL: &str = "demo_apps/assets/Flamingo.glb";

struct FlamingoDemo {
    fps_counter: FpsCounter,
}

impl AppHandler for FlamingoDemo {
    fn init(_window: &Arc<Window>) -> ardent::errors::Result<(Self, ArView)> {
        // Synthetic stand-ins: the source warms up for a few ticks, the
        // detector then holds the marker visible.
        let source = Box::new(SyntheticSource::new(640, 480, 3));
        let detector = Box::new(ScriptedDetector::from_visibility(&[true]));
        let tracking =
            TrackingContext::new(detector, DetectionMode::SingleMarker, 1, 0.1, 1000.0);

        let mut view = ArView::new(source, tracking, CALIBRATION);

        view.scene.add_light(Light::new_hemisphere(
            Vec3::new(0.8, 0.9, 1.0),
            Vec3::new(0.4, 0.35, 0.3),
            1.0,
        ));
        view.scene
            .add_light(Light::new_directional(Vec3::ONE, 1.5));

        // Translucent slab on the marker surface until the model arrives.
        let anchor = view.anchor_node(0)?;
        let geometry = view.assets.add_geometry(create_box(1.0, 0.1, 1.0));
        let material = view.assets.add_material(
            Material::new_lambert(Vec4::new(1.0, 1.0, 0.0, 1.0))
                .with_opacity(0.5)
                .with_double_sided(true),
        );
        let slab = view
            .scene
            .add_mesh_to_parent(Mesh::new(geometry, material).with_name("Slab"), anchor);
        if let Some(node) = view.scene.get_node_mut(slab) {
            node.transform.position.y = 0.05;
        }

        view.spawn_asset(
            MODEL,
            0,
            Placement {
                scale: 0.01,
                offset: Vec3::new(0.0, 1.0, 0.0),
                rotation: Quat::IDENTITY,
            },
        )?;

        Ok((
            Self {
                fps_counter: FpsCounter::new(),
            },
            view,
        ))
    }

    fn update(&mut self, _view: &mut ArView) {
        if let Some(fps) = self.fps_counter.update() {
            log::info!("FPS: {fps:.1}");
        }
    }
}

fn main() -> ardent::errors::Result<()> {
    env_logger::init();
    App::new().with_title("Marker Flamingo").run::<FlamingoDemo>()
}
