// src/pipeline/mod.rs
//
// Stateless per-frame lane pipeline:
//
//   color mask -> edges -> region filter -> Hough segments -> lane averaging
//     -> overlay
//
// `run` drives it over a frame source until end-of-stream or a quit key.

pub mod frame_context;
pub mod metrics;

pub use frame_context::FrameContext;
pub use metrics::{MetricsSummary, PipelineMetrics};

use anyhow::Result;
use opencv::{core::Mat, prelude::*};
use std::time::Instant;
use tracing::{debug, info};

use crate::color_analysis::segment_lane_colors;
use crate::lane_detection::{average_lanes, detect_segments};
use crate::preprocessing::{apply_region_mask, extract_edges};
use crate::road_overlay::render_lane_overlay;
use crate::types::Config;
use crate::video_processor::{FrameRecorder, FrameSink, FrameSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    QuitRequested,
}

#[derive(Debug, Clone)]
pub struct ProcessingStats {
    pub stop_reason: StopReason,
    pub metrics: MetricsSummary,
}

pub struct LanePipeline {
    config: Config,
}

impl LanePipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the detection stages on one color frame.
    pub fn analyze(&self, frame: &Mat, frame_id: u64) -> Result<FrameContext> {
        let color_mask = segment_lane_colors(frame, &self.config.color)?;
        let edges = extract_edges(&color_mask, &self.config.edges)?;
        let region_edges = apply_region_mask(&edges, &self.config.region)?;
        let segments = detect_segments(&region_edges, &self.config.hough)?;
        let lanes = average_lanes(&segments, frame.rows(), self.config.lanes.top_ratio);

        debug!(
            "Frame {}: {} segment(s), {} lane(s) ({})",
            frame_id,
            segments.len(),
            lanes.count(),
            lanes.as_str()
        );

        Ok(FrameContext { segments, lanes })
    }

    pub fn render(&self, frame: &Mat, context: &FrameContext) -> Result<Mat> {
        render_lane_overlay(frame, &context.lanes, &self.config.overlay)
    }

    pub fn process_frame(&self, frame: &Mat, frame_id: u64) -> Result<(FrameContext, Mat)> {
        let context = self.analyze(frame, frame_id)?;
        let output = self.render(frame, &context)?;
        Ok((context, output))
    }

    /// Processes frames until the source runs dry or the sink reports the
    /// quit key. The source (and recorder, if any) is released either way.
    pub fn run(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        mut recorder: Option<&mut dyn FrameRecorder>,
    ) -> Result<ProcessingStats> {
        let mut metrics = PipelineMetrics::new();

        let outcome = self.drive(source, sink, &mut recorder, &mut metrics);

        // Release everything before reporting; the loop error wins.
        let source_released = source.release();
        let recorder_released = match recorder {
            Some(r) => r.release(),
            None => Ok(()),
        };

        let stop_reason = outcome?;
        source_released?;
        recorder_released?;
        Ok(ProcessingStats {
            stop_reason,
            metrics: metrics.summary(),
        })
    }

    fn drive(
        &self,
        source: &mut dyn FrameSource,
        sink: &mut dyn FrameSink,
        recorder: &mut Option<&mut dyn FrameRecorder>,
        metrics: &mut PipelineMetrics,
    ) -> Result<StopReason> {
        let video = &self.config.video;
        let quit_key = video.quit_key as i32;
        let mut frame_id: u64 = 0;

        loop {
            if !source.is_open() {
                info!("Frame source closed. Exiting ...");
                return Ok(StopReason::EndOfStream);
            }

            let frame = match source.read_frame()? {
                Some(frame) => frame,
                None => {
                    info!("Can't receive frame (stream end?). Exiting ...");
                    return Ok(StopReason::EndOfStream);
                }
            };
            frame_id += 1;

            let started = Instant::now();
            let (context, output) = self.process_frame(&frame, frame_id)?;
            metrics.record(&context.lanes, context.segments.len(), started.elapsed());

            sink.show(&video.window_name, &output)?;
            if let Some(r) = recorder.as_mut() {
                r.write(&output)?;
            }

            let key = sink.poll_key(video.poll_timeout_ms)?;
            if key != -1 && (key & 0xFF) == quit_key {
                info!("Quit requested at frame {}", frame_id);
                return Ok(StopReason::QuitRequested);
            }
        }
    }
}
