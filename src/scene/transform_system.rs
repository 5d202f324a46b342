//! Transform System
//!
//! Hierarchical world matrix update for the scene graph, decoupled from
//! `Scene` to avoid borrow conflicts. Only borrows the node pool, the camera
//! pool and the root list.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::scene::camera::Camera;
use crate::scene::node::Node;
use crate::scene::{CameraKey, NodeHandle};

/// Updates world matrices for the whole hierarchy.
///
/// Uses an explicit stack instead of recursion so deep hierarchies cannot
/// overflow the call stack. A node's world matrix is recomputed when its own
/// local matrix changed or any ancestor's did. Cameras attached to updated
/// nodes get their view and view-projection matrices refreshed in the same
/// pass.
pub fn update_hierarchy_iterative(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    roots: &[NodeHandle],
) {
    // Work stack: (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let world_needs_update = local_changed || parent_changed;

        if world_needs_update {
            let new_world = parent_world_matrix * *node.transform.local_matrix();
            node.transform.set_world_matrix(new_world);

            if let Some(camera_key) = node.camera {
                if let Some(camera) = cameras.get_mut(camera_key) {
                    camera.update_view_projection(&new_world);
                }
            }
        }

        let current_world = node.transform.world_matrix;
        let children_count = node.children.len();

        // Push children in reverse to preserve traversal order.
        for i in (0..children_count).rev() {
            if let Some(node) = nodes.get(node_handle) {
                if let Some(&child_handle) = node.children.get(i) {
                    stack.push((child_handle, current_world, world_needs_update));
                }
            }
        }
    }
}

/// Updates a subtree starting at `root_handle`, forcing world recompute.
///
/// Useful after writing a tracking pose into an anchor's transform.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    cameras: &mut SlotMap<CameraKey, Camera>,
    root_handle: NodeHandle,
) {
    let parent_world = match nodes.get(root_handle) {
        Some(node) => match node.parent {
            Some(parent_handle) => nodes
                .get(parent_handle)
                .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix),
            None => Affine3A::IDENTITY,
        },
        None => return,
    };

    let mut stack: Vec<(NodeHandle, Affine3A)> = vec![(root_handle, parent_world)];

    while let Some((node_handle, parent_matrix)) = stack.pop() {
        let Some(node) = nodes.get_mut(node_handle) else {
            continue;
        };

        node.transform.update_local_matrix();
        let new_world = parent_matrix * *node.transform.local_matrix();
        node.transform.set_world_matrix(new_world);

        if let Some(camera_key) = node.camera {
            if let Some(camera) = cameras.get_mut(camera_key) {
                camera.update_view_projection(&new_world);
            }
        }

        let children: Vec<NodeHandle> = node.children.clone();
        for child in children.into_iter().rev() {
            stack.push((child, new_world));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn hierarchy_update_composes_parent_and_child() {
        let mut nodes: SlotMap<NodeHandle, Node> = SlotMap::with_key();
        let mut cameras: SlotMap<CameraKey, Camera> = SlotMap::with_key();

        let mut parent = Node::new("parent");
        parent.transform.position = Vec3::new(1.0, 0.0, 0.0);
        let parent_handle = nodes.insert(parent);

        let mut child = Node::new("child");
        child.transform.position = Vec3::new(0.0, 1.0, 0.0);
        child.parent = Some(parent_handle);
        let child_handle = nodes.insert(child);

        nodes
            .get_mut(parent_handle)
            .unwrap()
            .children
            .push(child_handle);

        let roots = vec![parent_handle];
        update_hierarchy_iterative(&mut nodes, &mut cameras, &roots);

        let child_world_pos = nodes
            .get(child_handle)
            .unwrap()
            .transform
            .world_matrix
            .translation;
        assert!((child_world_pos.x - 1.0).abs() < 1e-5);
        assert!((child_world_pos.y - 1.0).abs() < 1e-5);
    }
}
