use crate::assets::{GeometryHandle, MaterialHandle};

/// A renderable mesh instance: geometry plus material.
///
/// Owned by the scene's mesh pool and referenced from a node. The node's
/// transform and visibility decide where and whether it draws.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,

    pub geometry: GeometryHandle,
    pub material: MaterialHandle,

    /// Draw order within the same pass. Higher draws later.
    pub render_order: i32,
}

impl Mesh {
    pub fn new(geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry,
            material,
            render_order: 0,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}
