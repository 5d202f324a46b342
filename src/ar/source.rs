use std::sync::Arc;

/// One video frame handed to the detector.
///
/// Grayscale, row-major. Shared via `Arc` so holding a frame across a tick
/// never copies pixel data.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub luma: Arc<Vec<u8>>,
    /// Monotonic frame counter from the source
    pub sequence: u64,
}

/// A source of camera frames.
///
/// Real capture backends report not-ready until the device delivers its
/// first frame; the tracking context stays uninitialized until then and the
/// render loop skips tracking work for the whole warm-up.
pub trait VideoSource {
    /// Whether the source has delivered at least one frame.
    fn is_ready(&self) -> bool;

    /// Native size of the source in pixels (width, height).
    fn element_size(&self) -> (u32, u32);

    /// The most recent frame, if any. Repeated calls between source updates
    /// return the same frame.
    fn latest_frame(&mut self) -> Option<VideoFrame>;
}

/// Deterministic in-memory source.
///
/// Reports not-ready for a configurable number of `latest_frame` polls and
/// then produces flat gray frames with increasing sequence numbers. Stands
/// in for a camera in tests and headless demos.
pub struct SyntheticSource {
    width: u32,
    height: u32,
    warmup_polls: u32,
    polls: u32,
    sequence: u64,
    frame_data: Arc<Vec<u8>>,
}

impl SyntheticSource {
    #[must_use]
    pub fn new(width: u32, height: u32, warmup_polls: u32) -> Self {
        Self {
            width,
            height,
            warmup_polls,
            polls: 0,
            sequence: 0,
            frame_data: Arc::new(vec![0x80; (width * height) as usize]),
        }
    }
}

impl VideoSource for SyntheticSource {
    fn is_ready(&self) -> bool {
        self.polls >= self.warmup_polls
    }

    fn element_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn latest_frame(&mut self) -> Option<VideoFrame> {
        if self.polls < self.warmup_polls {
            self.polls += 1;
            return None;
        }

        self.sequence += 1;
        Some(VideoFrame {
            width: self.width,
            height: self.height,
            luma: Arc::clone(&self.frame_data),
            sequence: self.sequence,
        })
    }
}
