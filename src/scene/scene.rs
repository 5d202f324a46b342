use std::sync::atomic::{AtomicU32, Ordering};

use glam::{Affine3A, Vec4};
use slotmap::SlotMap;

use crate::resources::mesh::Mesh;
use crate::scene::camera::Camera;
use crate::scene::light::Light;
use crate::scene::node::Node;
use crate::scene::transform::Transform;
use crate::scene::transform_system;
use crate::scene::{CameraKey, LightKey, MeshKey, NodeHandle};

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene graph container.
///
/// Pure data layer: the node hierarchy plus component pools for meshes,
/// cameras and lights. Matrix updates run through the decoupled
/// [`transform_system`]; rendering reads the cached world matrices.
pub struct Scene {
    pub id: u32,

    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    pub meshes: SlotMap<MeshKey, Mesh>,
    pub cameras: SlotMap<CameraKey, Camera>,
    pub lights: SlotMap<LightKey, Light>,

    /// Clear color. `None` renders with a transparent clear so the video
    /// background below the 3D layer stays visible.
    pub background: Option<Vec4>,

    /// Scene-level visibility. When false every draw is suppressed while
    /// the render pass itself still runs, so the clear (and therefore the
    /// video background) stays correct. Single-marker tracking toggles
    /// this from the marker's visibility.
    pub visible: bool,

    pub active_camera: Option<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),

            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SlotMap::with_key(),
            cameras: SlotMap::with_key(),
            lights: SlotMap::with_key(),

            background: None,
            visible: true,

            active_camera: None,
        }
    }

    /// Starts building a node with the fluent builder.
    pub fn build_node(&'_ mut self, name: &str) -> NodeBuilder<'_> {
        NodeBuilder::new(self, name)
    }

    /// Adds a node to the scene as a root node.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    /// Adds a node under an existing parent.
    pub fn add_to_parent(&mut self, child: Node, parent_handle: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);

        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(handle);
        }
        if let Some(c) = self.nodes.get_mut(handle) {
            c.parent = Some(parent_handle);
        }

        handle
    }

    /// Removes a node and its whole subtree, cleaning up attached components.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        let children = match self.nodes.get(handle) {
            Some(node) => node.children.clone(),
            None => return,
        };

        for child in children {
            self.remove_node(child);
        }

        let parent_opt = self.nodes.get(handle).and_then(|n| n.parent);

        if let Some(parent_handle) = parent_opt {
            if let Some(parent) = self.nodes.get_mut(parent_handle) {
                if let Some(pos) = parent.children.iter().position(|&x| x == handle) {
                    parent.children.remove(pos);
                }
            }
        } else if let Some(pos) = self.root_nodes.iter().position(|&x| x == handle) {
            self.root_nodes.remove(pos);
        }

        if let Some(node) = self.nodes.get(handle) {
            if let Some(mesh_key) = node.mesh {
                self.meshes.remove(mesh_key);
            }
            if let Some(camera_key) = node.camera {
                self.cameras.remove(camera_key);
            }
            if let Some(light_key) = node.light {
                self.lights.remove(light_key);
            }
        }

        self.nodes.remove(handle);
    }

    /// Reparents `child_handle` under `parent_handle`.
    pub fn attach(&mut self, child_handle: NodeHandle, parent_handle: NodeHandle) {
        if child_handle == parent_handle {
            log::warn!("Cannot attach node to itself!");
            return;
        }

        // Detach from old parent (or the root list).
        let old_parent = self.nodes.get(child_handle).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p) {
                if let Some(i) = n.children.iter().position(|&x| x == child_handle) {
                    n.children.remove(i);
                }
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child_handle) {
            self.root_nodes.remove(i);
        }

        if let Some(p) = self.nodes.get_mut(parent_handle) {
            p.children.push(child_handle);
        } else {
            log::error!("Parent node not found during attach!");
            self.root_nodes.push(child_handle);
            return;
        }

        if let Some(c) = self.nodes.get_mut(child_handle) {
            c.parent = Some(parent_handle);
            c.transform.mark_dirty();
        }
    }

    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    /// Depth-first search for a node by name within the subtree rooted at
    /// `root`. Animation binding resolves track targets this way.
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let node = self.nodes.get(handle)?;
            if node.name == name {
                return Some(handle);
            }
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        None
    }

    /// Sets the shadow flags on `root` and every node below it. Model
    /// splicing marks freshly attached subtrees as both casting and
    /// receiving.
    pub fn set_subtree_shadow_flags(&mut self, root: NodeHandle, cast: bool, receive: bool) {
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            node.cast_shadow = cast;
            node.receive_shadow = receive;
            stack.extend(node.children.iter().copied());
        }
    }

    // ========================================================================
    // Component Query API
    // ========================================================================

    /// (Transform, Camera) bundle for the active camera.
    pub fn query_main_camera_bundle(&mut self) -> Option<(&mut Transform, &mut Camera)> {
        let node_id = self.active_camera?;
        self.query_camera_bundle(node_id)
    }

    pub fn query_camera_bundle(
        &mut self,
        node_id: NodeHandle,
    ) -> Option<(&mut Transform, &mut Camera)> {
        let camera_key = self.nodes.get(node_id)?.camera?;
        let camera = self.cameras.get_mut(camera_key)?;
        let transform = &mut self.nodes.get_mut(node_id)?.transform;

        Some((transform, camera))
    }

    /// Iterates lights together with their owning node's world matrix.
    pub fn iter_active_lights(&self) -> impl Iterator<Item = (&Light, &Affine3A)> {
        self.lights.iter().filter_map(move |(light_key, light)| {
            let node_opt = self
                .nodes
                .iter()
                .find_map(|(_, node)| (node.light == Some(light_key)).then_some(node));
            node_opt.map(|node| (light, &node.transform.world_matrix))
        })
    }

    /// Collects (mesh, world matrix) pairs for all effectively visible mesh
    /// nodes. A node is effectively visible only if its own flag and every
    /// ancestor's flag is set, so toggling an anchor group hides its whole
    /// subtree without touching descendant flags.
    pub fn visible_mesh_instances(&self) -> Vec<(MeshKey, Affine3A)> {
        let mut out = Vec::new();
        if !self.visible {
            return out;
        }
        let mut stack: Vec<(NodeHandle, bool)> = self
            .root_nodes
            .iter()
            .rev()
            .map(|&h| (h, true))
            .collect();

        while let Some((handle, parent_visible)) = stack.pop() {
            let Some(node) = self.nodes.get(handle) else {
                continue;
            };
            let visible = parent_visible && node.visible;
            if visible {
                if let Some(mesh_key) = node.mesh {
                    out.push((mesh_key, node.transform.world_matrix));
                }
            }
            for &child in node.children.iter().rev() {
                stack.push((child, visible));
            }
        }

        out
    }

    // ========================================================================
    // Matrix Update Pipeline
    // ========================================================================

    /// Updates world matrices for the whole scene. Must run once per tick
    /// before rendering.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(
            &mut self.nodes,
            &mut self.cameras,
            &self.root_nodes,
        );
    }

    /// Updates world matrices for one subtree only.
    pub fn update_subtree(&mut self, root_handle: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, &mut self.cameras, root_handle);
    }

    // ========================================================================
    // Component Insertion API
    // ========================================================================

    pub fn add_mesh(&mut self, mesh: Mesh) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_node(node)
    }

    pub fn add_mesh_to_parent(&mut self, mesh: Mesh, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new(&mesh.name);
        node.mesh = Some(self.meshes.insert(mesh));
        self.add_to_parent(node, parent)
    }

    pub fn add_camera(&mut self, camera: Camera) -> NodeHandle {
        let mut node = Node::new("Camera");
        node.camera = Some(self.cameras.insert(camera));
        self.add_node(node)
    }

    pub fn add_light(&mut self, light: Light) -> NodeHandle {
        let mut node = Node::new("Light");
        node.light = Some(self.lights.insert(light));
        self.add_node(node)
    }

    pub fn add_light_to_parent(&mut self, light: Light, parent: NodeHandle) -> NodeHandle {
        let mut node = Node::new("Light");
        node.light = Some(self.lights.insert(light));
        self.add_to_parent(node, parent)
    }
}

/// Fluent node construction helper.
pub struct NodeBuilder<'a> {
    scene: &'a mut Scene,
    node: Node,
    parent: Option<NodeHandle>,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(scene: &'a mut Scene, name: &str) -> Self {
        Self {
            scene,
            node: Node::new(name),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: f32, y: f32, z: f32) -> Self {
        self.node.transform.position = glam::Vec3::new(x, y, z);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, s: f32) -> Self {
        self.node.transform.scale = glam::Vec3::splat(s);
        self
    }

    #[must_use]
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.node.visible = visible;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: NodeHandle) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_mesh(mut self, mesh: MeshKey) -> Self {
        self.node.mesh = Some(mesh);
        self
    }

    pub fn build(self) -> NodeHandle {
        match self.parent {
            Some(parent) => self.scene.add_to_parent(self.node, parent),
            None => self.scene.add_node(self.node),
        }
    }
}
