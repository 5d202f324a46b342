use std::sync::Arc;

use crate::animation::clip::AnimationClip;
use crate::resources::mesh::Mesh;
use crate::scene::transform::Transform;
use crate::scene::{Node, NodeHandle, Scene};

/// Prefab node: pure data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct PrefabNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices into `Prefab.nodes`
    pub children_indices: Vec<usize>,
    /// Mesh component, if any
    pub mesh: Option<Mesh>,
}

impl PrefabNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Decoded model data, the intermediate form between a glTF file and scene
/// nodes.
///
/// A `Prefab` is a thread-safe pure data structure holding no scene handles,
/// so the decode task can build it off the render loop. [`Prefab::instantiate`]
/// splices it under a parent node.
#[derive(Debug, Clone, Default)]
pub struct Prefab {
    /// All nodes, flattened
    pub nodes: Vec<PrefabNode>,
    /// Indices of root nodes in `nodes`
    pub root_indices: Vec<usize>,
    /// Animation clips decoded alongside the node tree
    pub animations: Vec<Arc<AnimationClip>>,
}

impl Prefab {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splices this prefab into the scene under `parent`.
    ///
    /// Creates a wrapper group node holding all prefab roots and returns its
    /// handle. Callers apply placement (scale, offset, rotation) to the
    /// wrapper so the prefab's internal transforms stay untouched, and bind
    /// animation clips against the returned handle.
    pub fn instantiate(&self, scene: &mut Scene, parent: NodeHandle) -> NodeHandle {
        let group = scene.add_to_parent(Node::new("PrefabRoot"), parent);

        for &root_idx in &self.root_indices {
            self.instantiate_node(scene, root_idx, group);
        }

        group
    }

    fn instantiate_node(&self, scene: &mut Scene, node_idx: usize, parent: NodeHandle) {
        let prefab_node = &self.nodes[node_idx];

        let name = prefab_node.name.as_deref().unwrap_or("Node");
        let mut node = Node::new(name);
        node.transform = prefab_node.transform.clone();
        node.transform.mark_dirty();

        if let Some(mesh) = &prefab_node.mesh {
            node.mesh = Some(scene.meshes.insert(mesh.clone()));
        }

        let handle = scene.add_to_parent(node, parent);

        for &child_idx in &prefab_node.children_indices {
            self.instantiate_node(scene, child_idx, handle);
        }
    }
}

/// Thread-safe prefab reference.
pub type SharedPrefab = Arc<Prefab>;
