// src/video_processor.rs

use crate::types::VideoConfig;
use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat},
    highgui,
    prelude::*,
    videoio::{self, VideoCapture, VideoCaptureTraitConst, VideoWriter},
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "avi", "mov", "mkv", "MP4", "AVI", "MOV", "MKV"];

/// Anything that yields frames until end-of-stream.
pub trait FrameSource {
    fn is_open(&self) -> bool;
    /// `None` at end-of-stream or on an empty read.
    fn read_frame(&mut self) -> Result<Option<Mat>>;
    fn release(&mut self) -> Result<()>;
}

/// Where rendered frames are shown; also the place quit requests come from.
pub trait FrameSink {
    fn show(&mut self, window_name: &str, frame: &Mat) -> Result<()>;
    /// Key code pressed within `timeout_ms`, or -1.
    fn poll_key(&mut self, timeout_ms: i32) -> Result<i32>;
}

pub trait FrameRecorder {
    fn write(&mut self, frame: &Mat) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

pub struct VideoProcessor {
    config: VideoConfig,
}

impl VideoProcessor {
    pub fn new(config: VideoConfig) -> Self {
        Self { config }
    }

    /// Resolves `input` to a list of video files. A file is returned as-is;
    /// a directory is walked recursively.
    pub fn find_video_files(&self, input: &Path) -> Result<Vec<PathBuf>> {
        if input.is_file() {
            return Ok(vec![input.to_path_buf()]);
        }
        if !input.is_dir() {
            anyhow::bail!("Input not found: {}", input.display());
        }

        let mut videos: Vec<PathBuf> = WalkDir::new(input)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| is_video_file(p))
            .collect();
        videos.sort();

        info!("Found {} video files", videos.len());
        Ok(videos)
    }

    pub fn open_video(&self, path: &Path) -> Result<VideoReader> {
        info!("Opening video: {}", path.display());

        let path_str = path
            .to_str()
            .with_context(|| format!("Non UTF-8 path: {}", path.display()))?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            anyhow::bail!("Failed to open video file {}", path.display());
        }

        let fps = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FPS)?;
        let total_frames = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = VideoCaptureTraitConst::get(&cap, videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(VideoReader {
            cap,
            fps,
            total_frames,
            current_frame: 0,
            width,
            height,
        })
    }

    pub fn create_writer(
        &self,
        input_path: &Path,
        width: i32,
        height: i32,
        fps: f64,
    ) -> Result<Option<AnnotatedWriter>> {
        if !self.config.save_annotated {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("Failed to create {}", self.config.output_dir))?;

        let output_path = annotated_output_path(&self.config.output_dir, input_path);
        let output_str = output_path
            .to_str()
            .with_context(|| format!("Non UTF-8 path: {}", output_path.display()))?;

        info!("Output video: {}", output_path.display());

        // Some containers report 0 FPS; fall back to a common rate.
        let fps = if fps > 0.0 { fps } else { 30.0 };
        let fourcc = VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = VideoWriter::new(
            output_str,
            fourcc,
            fps,
            core::Size::new(width, height),
            true,
        )?;

        if !writer.is_opened()? {
            anyhow::bail!("Failed to open writer at {}", output_path.display());
        }

        Ok(Some(AnnotatedWriter { writer }))
    }
}

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

pub fn annotated_output_path(output_dir: &str, input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    PathBuf::from(output_dir).join(format!("{}_lanes.mp4", stem))
}

pub struct VideoReader {
    pub cap: VideoCapture,
    pub fps: f64,
    pub total_frames: i32,
    pub current_frame: i32,
    pub width: i32,
    pub height: i32,
}

impl VideoReader {
    pub fn progress(&self) -> f32 {
        if self.total_frames <= 0 {
            return 0.0;
        }
        (self.current_frame as f32 / self.total_frames as f32) * 100.0
    }
}

impl FrameSource for VideoReader {
    fn is_open(&self) -> bool {
        self.cap.is_opened().unwrap_or(false)
    }

    fn read_frame(&mut self) -> Result<Option<Mat>> {
        use opencv::videoio::VideoCaptureTrait;

        let mut mat = Mat::default();
        if !VideoCaptureTrait::read(&mut self.cap, &mut mat)? || mat.empty() {
            return Ok(None);
        }

        self.current_frame += 1;
        Ok(Some(mat))
    }

    fn release(&mut self) -> Result<()> {
        use opencv::videoio::VideoCaptureTrait;

        VideoCaptureTrait::release(&mut self.cap)?;
        debug!("Capture released after {} frames", self.current_frame);
        Ok(())
    }
}

/// On-screen window backed by `highgui`.
pub struct DisplayWindow {
    name: String,
}

impl DisplayWindow {
    pub fn new(name: &str) -> Result<Self> {
        highgui::named_window(name, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            name: name.to_string(),
        })
    }
}

impl FrameSink for DisplayWindow {
    fn show(&mut self, window_name: &str, frame: &Mat) -> Result<()> {
        highgui::imshow(window_name, frame)?;
        Ok(())
    }

    fn poll_key(&mut self, timeout_ms: i32) -> Result<i32> {
        Ok(highgui::wait_key(timeout_ms)?)
    }
}

impl Drop for DisplayWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_window(&self.name);
    }
}

/// Sink for runs without a display. Never requests quit.
#[derive(Debug, Default)]
pub struct HeadlessSink {
    pub frames_shown: u64,
}

impl FrameSink for HeadlessSink {
    fn show(&mut self, _window_name: &str, _frame: &Mat) -> Result<()> {
        self.frames_shown += 1;
        Ok(())
    }

    fn poll_key(&mut self, _timeout_ms: i32) -> Result<i32> {
        Ok(-1)
    }
}

pub struct AnnotatedWriter {
    writer: VideoWriter,
}

impl FrameRecorder for AnnotatedWriter {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        use opencv::videoio::VideoWriterTrait;

        VideoWriterTrait::write(&mut self.writer, frame)?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        use opencv::videoio::VideoWriterTrait;

        VideoWriterTrait::release(&mut self.writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension_filter() {
        assert!(is_video_file(Path::new("clips/solidWhiteRight.mp4")));
        assert!(is_video_file(Path::new("clips/challenge.MOV")));
        assert!(!is_video_file(Path::new("clips/notes.txt")));
        assert!(!is_video_file(Path::new("clips/no_extension")));
    }

    #[test]
    fn test_annotated_output_path() {
        let path = annotated_output_path("output", Path::new("videos/solidYellowLeft.mp4"));
        assert_eq!(path, PathBuf::from("output/solidYellowLeft_lanes.mp4"));
    }

    #[test]
    fn test_missing_input_is_error() {
        let processor = VideoProcessor::new(VideoConfig::default());
        assert!(processor
            .find_video_files(Path::new("definitely/not/here"))
            .is_err());
    }

    #[test]
    fn test_headless_sink_never_quits() {
        let mut sink = HeadlessSink::default();
        let frame = Mat::default();
        sink.show("result", &frame).unwrap();
        assert_eq!(sink.poll_key(1).unwrap(), -1);
        assert_eq!(sink.frames_shown, 1);
    }
}
