//! Scene Graph Module
//!
//! Manages the scene hierarchy and its components:
//! - [`Node`]: scene node (parent/child links and transform)
//! - [`Transform`]: TRS component with cached matrices and dirty tracking
//! - [`Scene`]: scene container and component pools
//! - [`Camera`]: camera component
//! - [`Light`]: light component
//! - [`transform_system`]: decoupled world matrix update

pub mod camera;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;
pub mod transform_system;

pub use camera::{Camera, Frustum, ProjectionType};
pub use light::{Light, LightKind};
pub use node::Node;
pub use scene::Scene;
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct MeshKey;
    pub struct CameraKey;
    pub struct LightKey;
}
