use crate::animation::binding::PropertyBinding;
use crate::animation::clip::AnimationClip;
use crate::scene::{NodeHandle, Scene};

pub struct Binder;

impl Binder {
    /// Resolves a clip's tracks to concrete node handles in the subtree
    /// rooted at `root_node`. Tracks whose target node is not found are
    /// skipped, matching the lenient behavior of web animation mixers.
    pub fn bind(scene: &Scene, root_node: NodeHandle, clip: &AnimationClip) -> Vec<PropertyBinding> {
        let mut bindings = Vec::with_capacity(clip.tracks.len());

        for (track_idx, track) in clip.tracks.iter().enumerate() {
            let node_name = &track.meta.node_name;

            if let Some(node_handle) = scene.find_node_by_name(root_node, node_name) {
                bindings.push(PropertyBinding {
                    track_index: track_idx,
                    node_handle,
                    target: track.meta.target,
                });
            } else {
                log::debug!("Animation track target '{node_name}' not found, skipping");
            }
        }

        bindings
    }
}
