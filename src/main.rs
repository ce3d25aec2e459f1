// src/main.rs

mod color_analysis;
mod config;
mod lane_detection;
mod pipeline;
mod preprocessing;
mod road_overlay;
mod types;
mod video_processor;

use anyhow::Result;
use pipeline::{LanePipeline, ProcessingStats, StopReason};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;
use video_processor::{DisplayWindow, FrameRecorder, FrameSink, HeadlessSink, VideoProcessor};

const CONFIG_PATH: &str = "config.yaml";

fn main() -> Result<()> {
    let mut config = Config::load_or_default(CONFIG_PATH)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("lane_finder={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🛣️  Lane Finder Starting");

    if Path::new(CONFIG_PATH).exists() {
        info!("✓ Configuration loaded from {}", CONFIG_PATH);
    } else {
        warn!("{} not found, using built-in defaults", CONFIG_PATH);
    }

    if let Some(input) = std::env::args().nth(1) {
        config.video.input = input;
    }

    info!(
        "Thresholds: canny={:.0}/{:.0}, hough votes={}, min_len={:.0}, max_gap={:.0}",
        config.edges.canny_low,
        config.edges.canny_high,
        config.hough.vote_threshold,
        config.hough.min_segment_length,
        config.hough.max_segment_gap
    );

    let video_processor = VideoProcessor::new(config.video.clone());
    let video_files = video_processor.find_video_files(Path::new(&config.video.input))?;

    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input);
        return Ok(());
    }

    let pipeline = LanePipeline::new(config.clone());

    for (idx, video_path) in video_files.iter().enumerate() {
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );

        match process_video(video_path, &pipeline, &video_processor) {
            Ok(stats) => {
                log_stats(&stats);
                if stats.stop_reason == StopReason::QuitRequested {
                    info!("Quit requested, skipping remaining videos");
                    break;
                }
            }
            Err(e) => {
                error!("Failed to process video {}: {:#}", video_path.display(), e);
            }
        }
    }

    Ok(())
}

fn process_video(
    video_path: &Path,
    pipeline: &LanePipeline,
    video_processor: &VideoProcessor,
) -> Result<ProcessingStats> {
    let video = &pipeline.config().video;

    let mut reader = video_processor.open_video(video_path)?;
    let mut writer =
        video_processor.create_writer(video_path, reader.width, reader.height, reader.fps)?;

    let mut sink: Box<dyn FrameSink> = if video.display {
        Box::new(DisplayWindow::new(&video.window_name)?)
    } else {
        Box::new(HeadlessSink::default())
    };

    let recorder = writer.as_mut().map(|w| w as &mut dyn FrameRecorder);
    let stats = pipeline.run(&mut reader, sink.as_mut(), recorder)?;

    if stats.stop_reason == StopReason::QuitRequested {
        warn!("Stopped at {:.1}% of the video", reader.progress());
    }

    Ok(stats)
}

fn log_stats(stats: &ProcessingStats) {
    let m = &stats.metrics;
    info!("✓ Video processed ({:?})", stats.stop_reason);
    info!("  Total frames: {}", m.total_frames);
    info!(
        "  Both lanes: {} | left only: {} | right only: {} | none: {}",
        m.frames_both_lanes, m.frames_left_only, m.frames_right_only, m.frames_no_lanes
    );
    info!(
        "  Segments detected: {} ({:.1} per frame)",
        m.total_segments,
        m.total_segments as f64 / m.total_frames.max(1) as f64
    );
    info!(
        "  Processing: {:.2} ms/frame, {:.1} FPS overall",
        m.avg_processing_ms, m.fps
    );

    match serde_json::to_string(m) {
        Ok(json) => info!("  Summary: {}", json),
        Err(e) => warn!("Could not serialize summary: {}", e),
    }
}
