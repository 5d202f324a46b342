use std::borrow::Cow;

use glam::Affine3A;

use crate::scene::transform::Transform;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeHandle};

/// A scene node.
///
/// Keeps the hot data traversed every frame (hierarchy links and transform)
/// together with optional component keys into the scene's pools.
///
/// Nodes form a tree through parent/child links. `visible` is the node's own
/// flag; effective visibility is the AND of the flags along the path from the
/// root, which the renderer computes during traversal. Anchor group nodes use
/// this to hide an entire subtree when its target is not detected.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node name, used by animation track binding.
    pub name: Cow<'static, str>,

    /// Parent node handle (None for root nodes)
    pub(crate) parent: Option<NodeHandle>,
    /// Child node handles
    pub(crate) children: Vec<NodeHandle>,

    /// Transform component (hot data accessed every frame)
    pub transform: Transform,

    /// Visibility flag, combined with ancestors during traversal
    pub visible: bool,

    /// Shadow participation flags. Carried on every node and set for whole
    /// model subtrees when they are spliced under an anchor; the forward
    /// pass has no shadow map yet and leaves them unread.
    pub cast_shadow: bool,
    pub receive_shadow: bool,

    // Component keys into the scene pools.
    pub mesh: Option<MeshKey>,
    pub camera: Option<CameraKey>,
    pub light: Option<LightKey>,
}

impl Node {
    /// Creates a new node with default transform and visibility.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Cow::Owned(name.to_string()),
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            cast_shadow: false,
            receive_shadow: false,
            mesh: None,
            camera: None,
            light: None,
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns a reference to the world transformation matrix.
    ///
    /// Updated by the transform system each frame.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new("Node")
    }
}
