//! Marker Horse Demo
//!
//! Overlays a galloping horse model on a single tracked marker, with a flat
//! ground plane marking the tracked surface while the model decodes.

use std::sync::Arc;

use glam::{Quat, Vec3, Vec4};

use ardent::app::{App, AppHandler, Window};
use ardent::{
    create_plane, ArView, DetectionMode, Light, Material, Mesh, Placement, PlaneOptions,
    ScriptedDetector, SyntheticSource, TrackingContext,
};

const CALIBRATION: &str = "demo_apps/assets/camera_para.dat";
const MODEL: &str = "demo_apps/assets/Horse.glb";

struct HorseDemo;

impl AppHandler for HorseDemo {
    fn init(_window: &Arc<Window>) -> ardent::errors::Result<(Self, ArView)> {
        let source = Box::new(SyntheticSource::new(640, 480, 3));
        let detector = Box::new(ScriptedDetector::from_visibility(&[true]));
        let tracking =
            TrackingContext::new(detector, DetectionMode::SingleMarker, 1, 0.1, 1000.0);

        let mut view = ArView::new(source, tracking, CALIBRATION);

        view.scene.add_light(Light::new_hemisphere(
            Vec3::ONE,
            Vec3::new(0.3, 0.3, 0.3),
            1.2,
        ));

        // Ground plane lying flat on the marker.
        let anchor = view.anchor_node(0)?;
        let geometry = view.assets.add_geometry(create_plane(PlaneOptions {
            width: 1.5,
            height: 1.5,
            ..Default::default()
        }));
        let material = view.assets.add_material(
            Material::new_lambert(Vec4::new(0.2, 0.5, 0.2, 1.0)).with_opacity(0.6),
        );
        let plane = view
            .scene
            .add_mesh_to_parent(Mesh::new(geometry, material).with_name("Ground"), anchor);
        if let Some(node) = view.scene.get_node_mut(plane) {
            node.transform.rotation = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
        }

        view.spawn_asset(
            MODEL,
            0,
            Placement {
                scale: 0.005,
                offset: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        )?;

        Ok((Self, view))
    }
}

fn main() -> ardent::errors::Result<()> {
    env_logger::init();
    App::new().with_title("Marker Horse").run::<HorseDemo>()
}
