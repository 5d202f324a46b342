use std::collections::VecDeque;

use glam::Affine3A;

use crate::ar::source::VideoFrame;

/// One detected target in a frame.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Index of the anchor this detection belongs to
    pub anchor_index: usize,
    /// Pose of the target in camera space
    pub pose: Affine3A,
    /// Detector confidence in [0, 1]
    pub confidence: f32,
}

/// Finds tracked targets in video frames.
///
/// Implementations return every target found in the given frame; absence
/// from the result list means the target was not detected this frame and
/// its anchor goes hidden.
pub trait Detector {
    fn detect(&mut self, frame: &VideoFrame) -> Vec<Detection>;
}

/// Replays a pre-recorded detection sequence, one entry per frame.
///
/// Once the script runs out it keeps returning the last entry. Drives tests
/// and headless demos with exact per-tick control over which anchors are
/// seen.
#[derive(Default)]
pub struct ScriptedDetector {
    script: VecDeque<Vec<Detection>>,
    last: Vec<Detection>,
}

impl ScriptedDetector {
    #[must_use]
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
            last: Vec::new(),
        }
    }

    /// Convenience: a script of bare visibility flags for anchor 0 with an
    /// identity pose.
    #[must_use]
    pub fn from_visibility(flags: &[bool]) -> Self {
        let script = flags
            .iter()
            .map(|&visible| {
                if visible {
                    vec![Detection {
                        anchor_index: 0,
                        pose: Affine3A::IDENTITY,
                        confidence: 1.0,
                    }]
                } else {
                    Vec::new()
                }
            })
            .collect();
        Self::new(script)
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, _frame: &VideoFrame) -> Vec<Detection> {
        if let Some(entry) = self.script.pop_front() {
            self.last = entry;
        }
        self.last.clone()
    }
}
