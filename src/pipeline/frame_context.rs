// src/pipeline/frame_context.rs
//
// What the pipeline derived from one frame. Intermediate masks are dropped
// inside `analyze`; only the Hough output and the lane outcome survive.

use crate::types::{LaneDetection, Segment};

#[derive(Debug, Clone)]
pub struct FrameContext {
    pub segments: Vec<Segment>,
    pub lanes: LaneDetection,
}
