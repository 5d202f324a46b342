use crate::animation::action::{AnimationAction, TrackValue};
use crate::animation::binding::TargetPath;
use crate::scene::Scene;

/// Owns the actions created for one loaded model instance.
///
/// One mixer is created per completed model load and registered with the
/// view's mixer list, which only ever grows. Mixers advance every tick
/// regardless of anchor visibility, so a model that reappears after its
/// target was lost shows the animation at its wall-clock position rather
/// than where it left off.
pub struct AnimationMixer {
    actions: Vec<AnimationAction>,
}

impl Default for AnimationMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationMixer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn add_action(&mut self, action: AnimationAction) {
        self.actions.push(action);
    }

    #[must_use]
    pub fn actions(&self) -> &[AnimationAction] {
        &self.actions
    }

    /// Number of actions currently advancing.
    #[must_use]
    pub fn playing_action_count(&self) -> usize {
        self.actions.iter().filter(|a| a.is_playing()).count()
    }

    /// Clip names of all registered actions, in registration order.
    pub fn list_animations(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.clip().name.as_str())
    }

    /// (Re)starts the action whose clip has the given name. Returns false
    /// when no such clip is registered.
    pub fn play(&mut self, name: &str) -> bool {
        match self.actions.iter_mut().find(|a| a.clip().name == name) {
            Some(action) => {
                action.play();
                true
            }
            None => false,
        }
    }

    /// Advances all actions by `dt` seconds and writes sampled values into
    /// the bound node transforms.
    pub fn update(&mut self, dt: f32, scene: &mut Scene) {
        for action in &mut self.actions {
            action.update(dt);
        }

        for action in &mut self.actions {
            if !action.is_playing() || action.weight <= 0.0 {
                continue;
            }

            for binding_idx in 0..action.bindings.len() {
                let (track_index, node_handle, target) = {
                    let b = &action.bindings[binding_idx];
                    (b.track_index, b.node_handle, b.target)
                };

                let Some(value) = action.sample_track(track_index) else {
                    continue;
                };

                let Some(node) = scene.get_node_mut(node_handle) else {
                    continue;
                };

                match (value, target) {
                    (TrackValue::Vector3(v), TargetPath::Translation) => {
                        node.transform.position = v;
                        node.transform.mark_dirty();
                    }
                    (TrackValue::Vector3(v), TargetPath::Scale) => {
                        node.transform.scale = v;
                        node.transform.mark_dirty();
                    }
                    (TrackValue::Quaternion(q), TargetPath::Rotation) => {
                        node.transform.rotation = q;
                        node.transform.mark_dirty();
                    }
                    _ => {}
                }
            }
        }
    }
}
