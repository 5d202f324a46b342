use crate::scene::NodeHandle;

/// The target property a track writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation, // transform.position
    Rotation,    // transform.rotation
    Scale,       // transform.scale
}

/// Maps track `track_index` of a clip to the target property of
/// `node_handle` in the scene.
#[derive(Debug, Clone)]
pub struct PropertyBinding {
    pub track_index: usize,
    pub node_handle: NodeHandle,
    pub target: TargetPath,
}
