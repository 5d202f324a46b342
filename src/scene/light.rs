use std::hash::{Hash, Hasher};

use glam::Vec3;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct DirectionalLight;

#[derive(Debug, Clone)]
pub struct PointLight {
    pub range: f32,
}

/// Hemisphere lights blend between a sky and a ground color based on the
/// surface normal's vertical component.
#[derive(Debug, Clone)]
pub struct HemisphereLight {
    pub ground_color: Vec3,
}

/// Light component in the scene.
#[derive(Debug, Clone)]
pub enum LightKind {
    Directional(DirectionalLight),
    Point(PointLight),
    Hemisphere(HemisphereLight),
}

#[derive(Debug, Clone)]
pub struct Light {
    pub uuid: Uuid,
    pub id: u64,
    pub color: Vec3,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    fn generate_id_from_uuid(uuid: &Uuid) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        uuid.hash(&mut hasher);
        hasher.finish()
    }

    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            id: Self::generate_id_from_uuid(&uuid),
            color,
            intensity,
            kind: LightKind::Directional(DirectionalLight),
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, range: f32) -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            id: Self::generate_id_from_uuid(&uuid),
            color,
            intensity,
            kind: LightKind::Point(PointLight { range }),
        }
    }

    #[must_use]
    pub fn new_hemisphere(sky_color: Vec3, ground_color: Vec3, intensity: f32) -> Self {
        let uuid = Uuid::new_v4();
        Self {
            uuid,
            id: Self::generate_id_from_uuid(&uuid),
            color: sky_color,
            intensity,
            kind: LightKind::Hemisphere(HemisphereLight { ground_color }),
        }
    }
}
