// src/pipeline/metrics.rs
//
// Per-video counters and timing for the lane pipeline. Logged once at the
// end of each video.

use std::time::{Duration, Instant};

use crate::types::LaneDetection;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: u64,
    pub frames_both_lanes: u64,
    pub frames_left_only: u64,
    pub frames_right_only: u64,
    pub frames_no_lanes: u64,
    pub total_segments: u64,
    pub processing_time: Duration,
    pub started_at: Instant,
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            frames_both_lanes: 0,
            frames_left_only: 0,
            frames_right_only: 0,
            frames_no_lanes: 0,
            total_segments: 0,
            processing_time: Duration::ZERO,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, lanes: &LaneDetection, segments: usize, elapsed: Duration) {
        self.total_frames += 1;
        self.total_segments += segments as u64;
        self.processing_time += elapsed;

        match lanes {
            LaneDetection::Both { .. } => self.frames_both_lanes += 1,
            LaneDetection::LeftOnly(_) => self.frames_left_only += 1,
            LaneDetection::RightOnly(_) => self.frames_right_only += 1,
            LaneDetection::NoLanes => self.frames_no_lanes += 1,
        }
    }

    /// Wall-clock throughput, display and capture included.
    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn avg_processing_ms(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.processing_time.as_secs_f64() * 1000.0 / self.total_frames as f64
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            fps: self.fps(),
            frames_both_lanes: self.frames_both_lanes,
            frames_left_only: self.frames_left_only,
            frames_right_only: self.frames_right_only,
            frames_no_lanes: self.frames_no_lanes,
            total_segments: self.total_segments,
            avg_processing_ms: self.avg_processing_ms(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_both_lanes: u64,
    pub frames_left_only: u64,
    pub frames_right_only: u64,
    pub frames_no_lanes: u64,
    pub total_segments: u64,
    pub avg_processing_ms: f64,
    pub elapsed_secs: f64,
}
