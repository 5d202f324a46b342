//! Image Targets Demo
//!
//! Two independent image targets, each carrying its own animated model.
//! Anchors show and hide on their own as targets enter and leave the frame;
//! here a scripted detector reports both targets at fixed poses.

use std::sync::Arc;

use glam::{Affine3A, Quat, Vec3, Vec4};

use ardent::app::{App, AppHandler, Window};
use ardent::{
    create_plane, ArView, Detection, DetectionMode, Light, Material, Mesh, Placement,
    PlaneOptions, ScriptedDetector, SyntheticSource, TrackingContext,
};

const CALIBRATION: &str = "demo_apps/assets/camera_para.dat";
const MODELS: [&str; 2] = [
    "demo_apps/assets/Flamingo.glb",
    "demo_apps/assets/Parrot.glb",
];

fn scripted_two_targets() -> ScriptedDetector {
    let detections = vec![
        Detection {
            anchor_index: 0,
            pose: Affine3A::from_translation(Vec3::new(-0.8, 0.0, -3.0)),
            confidence: 1.0,
        },
        Detection {
            anchor_index: 1,
            pose: Affine3A::from_translation(Vec3::new(0.8, 0.0, -3.0)),
            confidence: 1.0,
        },
    ];
    ScriptedDetector::new(vec![detections])
}

struct ImageTargetsDemo;

impl AppHandler for ImageTargetsDemo {
    fn init(_window: &Arc<Window>) -> ardent::errors::Result<(Self, ArView)> {
        let source = Box::new(SyntheticSource::new(640, 480, 3));
        let tracking = TrackingContext::new(
            Box::new(scripted_two_targets()),
            DetectionMode::ImageTargets,
            2,
            0.1,
            1000.0,
        );

        let mut view = ArView::new(source, tracking, CALIBRATION);

        view.scene.add_light(Light::new_hemisphere(
            Vec3::new(0.9, 0.9, 1.0),
            Vec3::new(0.3, 0.3, 0.3),
            1.0,
        ));
        view.scene
            .add_light(Light::new_directional(Vec3::ONE, 1.0));

        // Each anchor gets a translucent card until its model arrives.
        for index in 0..MODELS.len() {
            let anchor = view.anchor_node(index)?;
            let geometry = view.assets.add_geometry(create_plane(PlaneOptions {
                width: 1.0,
                height: 1.0,
                ..Default::default()
            }));
            let material = view.assets.add_material(
                Material::new_lambert(Vec4::new(0.3, 0.4, 0.7, 1.0)).with_opacity(0.5),
            );
            let card = view
                .scene
                .add_mesh_to_parent(Mesh::new(geometry, material).with_name("Card"), anchor);
            if let Some(node) = view.scene.get_node_mut(card) {
                node.transform.rotation = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2);
            }
        }

        for (index, model) in MODELS.iter().enumerate() {
            view.spawn_asset(
                *model,
                index,
                Placement {
                    scale: 0.01,
                    offset: Vec3::ZERO,
                    rotation: Quat::IDENTITY,
                },
            )?;
        }

        Ok((Self, view))
    }
}

fn main() -> ardent::errors::Result<()> {
    env_logger::init();
    App::new().with_title("Image Targets").run::<ImageTargetsDemo>()
}
