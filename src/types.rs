// src/types.rs

use serde::{Deserialize, Serialize};

// ============================================================================
// DEFAULT THRESHOLDS
// ============================================================================

pub const YELLOW_HUE_RANGE: [u8; 2] = [90, 110];
pub const YELLOW_SAT_RANGE: [u8; 2] = [140, 255];
pub const YELLOW_VAL_RANGE: [u8; 2] = [140, 255];

// Hue upper bound exceeds the 0-180 scale, so hue is effectively unconstrained.
pub const WHITE_HUE_RANGE: [u8; 2] = [0, 200];
pub const WHITE_SAT_RANGE: [u8; 2] = [0, 150];
pub const WHITE_VAL_RANGE: [u8; 2] = [150, 200];

pub const BLUR_KERNEL_SIZE: i32 = 5;
pub const CANNY_LOW: f64 = 50.0;
pub const CANNY_HIGH: f64 = 100.0;

pub const HOUGH_DIST_RES: f64 = 2.0;
pub const HOUGH_ANGLE_RES: f64 = std::f64::consts::PI / 180.0;
pub const HOUGH_VOTE_THRESHOLD: i32 = 30;
pub const MIN_SEGMENT_LENGTH: f64 = 20.0;
pub const MAX_SEGMENT_GAP: f64 = 5.0;

pub const LANE_TOP_RATIO: f64 = 3.0 / 5.0;

pub const LANE_LINE_WIDTH: i32 = 10;
/// BGR
pub const LANE_LINE_COLOR: [u8; 3] = [255, 0, 0];
pub const BLEND_ALPHA: f64 = 0.8;
pub const BLEND_BETA: f64 = 1.0;
pub const BLEND_GAMMA: f64 = 1.0;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub color: ColorConfig,
    pub edges: EdgeConfig,
    pub region: RegionConfig,
    pub hough: HoughConfig,
    pub lanes: LaneConfig,
    pub overlay: OverlayConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

/// Inclusive per-channel bounds in 8-bit HSV (hue scaled 0-180).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub hue: [u8; 2],
    pub saturation: [u8; 2],
    pub value: [u8; 2],
}

impl HsvRange {
    pub fn lower(&self) -> [f64; 3] {
        [
            self.hue[0] as f64,
            self.saturation[0] as f64,
            self.value[0] as f64,
        ]
    }

    pub fn upper(&self) -> [f64; 3] {
        [
            self.hue[1] as f64,
            self.saturation[1] as f64,
            self.value[1] as f64,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub yellow: HsvRange,
    pub white: HsvRange,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            yellow: HsvRange {
                hue: YELLOW_HUE_RANGE,
                saturation: YELLOW_SAT_RANGE,
                value: YELLOW_VAL_RANGE,
            },
            white: HsvRange {
                hue: WHITE_HUE_RANGE,
                saturation: WHITE_SAT_RANGE,
                value: WHITE_VAL_RANGE,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Odd, positive. Sigma is derived from it.
    pub blur_kernel_size: i32,
    pub canny_low: f64,
    pub canny_high: f64,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: BLUR_KERNEL_SIZE,
            canny_low: CANNY_LOW,
            canny_high: CANNY_HIGH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Apex row as a fraction of frame height, truncated toward zero.
    pub apex_y_ratio: f64,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self { apex_y_ratio: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    pub dist_resolution: f64,
    pub angle_resolution: f64,
    pub vote_threshold: i32,
    pub min_segment_length: f64,
    pub max_segment_gap: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            dist_resolution: HOUGH_DIST_RES,
            angle_resolution: HOUGH_ANGLE_RES,
            vote_threshold: HOUGH_VOTE_THRESHOLD,
            min_segment_length: MIN_SEGMENT_LENGTH,
            max_segment_gap: MAX_SEGMENT_GAP,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Far endpoint row of each lane line, as a fraction of frame height.
    pub top_ratio: f64,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            top_ratio: LANE_TOP_RATIO,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub line_width: i32,
    pub line_color: [u8; 3],
    pub blend_alpha: f64,
    pub blend_beta: f64,
    pub blend_gamma: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            line_width: LANE_LINE_WIDTH,
            line_color: LANE_LINE_COLOR,
            blend_alpha: BLEND_ALPHA,
            blend_beta: BLEND_BETA,
            blend_gamma: BLEND_GAMMA,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// A video file or a directory of videos.
    pub input: String,
    pub output_dir: String,
    pub display: bool,
    pub window_name: String,
    pub save_annotated: bool,
    pub quit_key: char,
    pub poll_timeout_ms: i32,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: "solidWhiteRight.mp4".to_string(),
            output_dir: "output".to_string(),
            display: true,
            window_name: "result".to_string(),
            save_annotated: false,
            quit_key: 'q',
            poll_timeout_ms: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// Raw straight-line candidate from the Hough stage, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Segment {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

/// `y = slope * x + intercept` in image coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineModel {
    pub slope: f64,
    pub intercept: f64,
}

/// Final renderable lane line, bottom endpoint first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneLine {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

/// Outcome of lane averaging for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDetection {
    NoLanes,
    LeftOnly(LaneLine),
    RightOnly(LaneLine),
    Both { left: LaneLine, right: LaneLine },
}

impl LaneDetection {
    pub fn from_sides(left: Option<LaneLine>, right: Option<LaneLine>) -> Self {
        match (left, right) {
            (Some(left), Some(right)) => LaneDetection::Both { left, right },
            (Some(left), None) => LaneDetection::LeftOnly(left),
            (None, Some(right)) => LaneDetection::RightOnly(right),
            (None, None) => LaneDetection::NoLanes,
        }
    }

    /// Lines in render order, left first.
    pub fn lines(&self) -> Vec<LaneLine> {
        match *self {
            LaneDetection::NoLanes => Vec::new(),
            LaneDetection::LeftOnly(line) | LaneDetection::RightOnly(line) => vec![line],
            LaneDetection::Both { left, right } => vec![left, right],
        }
    }

    pub fn count(&self) -> usize {
        match self {
            LaneDetection::NoLanes => 0,
            LaneDetection::LeftOnly(_) | LaneDetection::RightOnly(_) => 1,
            LaneDetection::Both { .. } => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneDetection::NoLanes => "NONE",
            LaneDetection::LeftOnly(_) => "LEFT",
            LaneDetection::RightOnly(_) => "RIGHT",
            LaneDetection::Both { .. } => "BOTH",
        }
    }
}
