// src/road_overlay.rs
//
// Lane lines are drawn on a blank canvas of the frame's size, then blended:
//
//   output = saturate(alpha * frame + beta * canvas + gamma)
//
// With no lanes the canvas is black and the output is the dimmed frame plus
// the constant offset.

use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar},
    imgproc,
    prelude::*,
};

use crate::types::{LaneDetection, LaneLine, OverlayConfig};

pub fn draw_lane_lines(frame: &Mat, lines: &[LaneLine], config: &OverlayConfig) -> Result<Mat> {
    let mut canvas = Mat::new_size_with_default(frame.size()?, frame.typ(), Scalar::all(0.0))?;
    let [b, g, r] = config.line_color;
    let color = Scalar::new(b as f64, g as f64, r as f64, 0.0);

    for line in lines {
        imgproc::line(
            &mut canvas,
            Point::new(line.x1, line.y1),
            Point::new(line.x2, line.y2),
            color,
            config.line_width,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(canvas)
}

pub fn render_lane_overlay(
    frame: &Mat,
    lanes: &LaneDetection,
    config: &OverlayConfig,
) -> Result<Mat> {
    let canvas = draw_lane_lines(frame, &lanes.lines(), config)?;

    let mut blended = Mat::default();
    core::add_weighted(
        frame,
        config.blend_alpha,
        &canvas,
        config.blend_beta,
        config.blend_gamma,
        &mut blended,
        -1,
    )?;
    Ok(blended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec3b, CV_8UC3};

    fn gradient_frame(width: i32, height: i32) -> Mat {
        let mut frame =
            Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0)).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 7 + y * 13) % 256) as u8;
                *frame.at_2d_mut::<Vec3b>(y, x).unwrap() = Vec3b::from_array([v, 255 - v, v / 2]);
            }
        }
        frame
    }

    #[test]
    fn test_blend_without_lanes_is_scaled_copy() {
        let frame = gradient_frame(32, 24);
        let config = OverlayConfig::default();
        let out = render_lane_overlay(&frame, &LaneDetection::NoLanes, &config).unwrap();
        assert_eq!(out.size().unwrap(), frame.size().unwrap());
        assert_eq!(out.typ(), frame.typ());

        let src = frame.data_bytes().unwrap();
        let dst = out.data_bytes().unwrap();
        for (&p, &q) in src.iter().zip(dst.iter()) {
            let expected = (p as f64 * config.blend_alpha + config.blend_gamma)
                .round()
                .clamp(0.0, 255.0);
            assert!((q as f64 - expected).abs() <= 1.0, "{} -> {}", p, q);
        }
    }

    #[test]
    fn test_blend_identity_within_offset() {
        let frame = gradient_frame(16, 16);
        let config = OverlayConfig {
            blend_alpha: 1.0,
            ..OverlayConfig::default()
        };
        let out = render_lane_overlay(&frame, &LaneDetection::NoLanes, &config).unwrap();

        let src = frame.data_bytes().unwrap();
        let dst = out.data_bytes().unwrap();
        for (&p, &q) in src.iter().zip(dst.iter()) {
            assert!((q as i32 - p as i32).abs() <= config.blend_gamma as i32);
        }
    }

    #[test]
    fn test_lane_lines_drawn_in_line_color() {
        let frame =
            Mat::new_rows_cols_with_default(100, 100, CV_8UC3, Scalar::all(0.0)).unwrap();
        let lanes = LaneDetection::LeftOnly(LaneLine {
            x1: 20,
            y1: 100,
            x2: 50,
            y2: 60,
        });
        let out = render_lane_overlay(&frame, &lanes, &OverlayConfig::default()).unwrap();

        // Mid-point of the line: blue channel saturates, others carry the offset.
        let px = *out.at_2d::<Vec3b>(80, 35).unwrap();
        assert_eq!(px[0], 255);
        assert_eq!(px[1], 1);
        assert_eq!(px[2], 1);

        let untouched = *out.at_2d::<Vec3b>(10, 90).unwrap();
        assert_eq!(untouched[0], 1);
    }

    #[test]
    fn test_line_width_applied() {
        let frame =
            Mat::new_rows_cols_with_default(50, 50, CV_8UC3, Scalar::all(0.0)).unwrap();
        let line = LaneLine {
            x1: 25,
            y1: 50,
            x2: 25,
            y2: 30,
        };
        let canvas = draw_lane_lines(&frame, &[line], &OverlayConfig::default()).unwrap();
        assert_eq!(canvas.at_2d::<Vec3b>(40, 21).unwrap()[0], 255);
        assert_eq!(canvas.at_2d::<Vec3b>(40, 29).unwrap()[0], 255);
        assert_eq!(canvas.at_2d::<Vec3b>(40, 35).unwrap()[0], 0);
    }
}
