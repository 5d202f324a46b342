use glam::Vec4;
use uuid::Uuid;

/// Shading parameters for a mesh.
///
/// A single forward-lit model with an unlit escape hatch. Placeholder
/// overlays use a transparent unlit material; decoded model meshes carry
/// their source base color.
#[derive(Debug, Clone)]
pub struct Material {
    pub uuid: Uuid,
    pub name: String,

    /// Base color (RGBA). Alpha multiplies with `opacity`.
    pub color: Vec4,
    pub opacity: f32,
    /// Render in the blended transparent pass, sorted back to front.
    pub transparent: bool,
    /// Disable backface culling.
    pub double_sided: bool,
    /// Skip lighting entirely.
    pub unlit: bool,
}

impl Material {
    /// Unlit flat-color material.
    #[must_use]
    pub fn new_basic(color: Vec4) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "BasicMaterial".to_string(),
            color,
            opacity: 1.0,
            transparent: false,
            double_sided: false,
            unlit: true,
        }
    }

    /// Lit material with lambert diffuse shading.
    #[must_use]
    pub fn new_lambert(color: Vec4) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: "LambertMaterial".to_string(),
            color,
            opacity: 1.0,
            transparent: false,
            double_sided: false,
            unlit: false,
        }
    }

    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self.transparent = opacity < 1.0;
        self
    }

    #[must_use]
    pub fn with_double_sided(mut self, double_sided: bool) -> Self {
        self.double_sided = double_sided;
        self
    }
}
