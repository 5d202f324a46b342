//! Resource Module
//!
//! CPU-side render resources:
//! - [`Geometry`]: vertex/index data with bounding volumes
//! - [`Material`]: shading parameters
//! - [`Mesh`]: geometry + material pairing referenced by scene nodes
//! - [`primitives`]: procedural geometry builders

pub mod geometry;
pub mod material;
pub mod mesh;
pub mod primitives;

pub use geometry::{BoundingBox, Geometry};
pub use material::Material;
pub use mesh::Mesh;
