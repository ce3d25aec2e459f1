// src/color_analysis.rs
//
// HSV thresholding for lane paint. Produces a binary mask (0/255) of pixels
// that fall inside the yellow or the white range.
//
// Frames arrive from the capture backend in BGR order but are converted with
// the RGB->HSV code. The default ranges are calibrated for that channel
// order: yellow paint reads as hue ~90-110 rather than ~20-35.

use anyhow::Result;
use opencv::{
    core::{self, Mat, Scalar},
    imgproc,
    prelude::*,
};
use tracing::debug;

use crate::types::{ColorConfig, HsvRange};

/// Lane paint mask for a 3-channel frame.
pub fn segment_lane_colors(frame: &Mat, config: &ColorConfig) -> Result<Mat> {
    if frame.channels() != 3 {
        anyhow::bail!(
            "color segmentation expects a 3-channel frame, got {} channel(s)",
            frame.channels()
        );
    }

    let mut hsv = Mat::default();
    imgproc::cvt_color(frame, &mut hsv, imgproc::COLOR_RGB2HSV, 0)?;

    let yellow = range_mask(&hsv, &config.yellow)?;
    let white = range_mask(&hsv, &config.white)?;

    let mut mask = Mat::default();
    core::bitwise_or(&white, &yellow, &mut mask, &core::no_array())?;

    debug!(
        "Color mask: {} candidate pixels",
        core::count_non_zero(&mask)?
    );

    Ok(mask)
}

fn range_mask(hsv: &Mat, range: &HsvRange) -> Result<Mat> {
    let [lh, ls, lv] = range.lower();
    let [uh, us, uv] = range.upper();

    let mut mask = Mat::default();
    core::in_range(
        hsv,
        &Scalar::new(lh, ls, lv, 0.0),
        &Scalar::new(uh, us, uv, 0.0),
        &mut mask,
    )?;
    Ok(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, Vec3b, CV_8UC1, CV_8UC3};

    fn solid(width: i32, height: i32, bgr: [f64; 3]) -> Mat {
        Mat::new_rows_cols_with_default(
            height,
            width,
            CV_8UC3,
            Scalar::new(bgr[0], bgr[1], bgr[2], 0.0),
        )
        .unwrap()
    }

    fn mask_value(frame: &Mat) -> u8 {
        let mask = segment_lane_colors(frame, &ColorConfig::default()).unwrap();
        *mask.at_2d::<u8>(0, 0).unwrap()
    }

    #[test]
    fn test_yellow_paint_selected() {
        // BGR (0, 255, 255) is yellow; read as RGB it has hue 90.
        assert_eq!(mask_value(&solid(4, 4, [0.0, 255.0, 255.0])), 255);
    }

    #[test]
    fn test_grey_white_paint_selected() {
        assert_eq!(mask_value(&solid(4, 4, [180.0, 180.0, 180.0])), 255);
    }

    #[test]
    fn test_saturated_white_and_black_rejected() {
        // Value 255 is above the white range ceiling of 200.
        assert_eq!(mask_value(&solid(4, 4, [255.0, 255.0, 255.0])), 0);
        assert_eq!(mask_value(&solid(4, 4, [0.0, 0.0, 0.0])), 0);
    }

    #[test]
    fn test_mask_is_binary_single_channel() {
        let mut frame = solid(32, 32, [40.0, 40.0, 40.0]);
        imgproc::rectangle(
            &mut frame,
            Rect::new(8, 8, 8, 16),
            Scalar::new(180.0, 180.0, 180.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();

        let mask = segment_lane_colors(&frame, &ColorConfig::default()).unwrap();
        assert_eq!(mask.typ(), CV_8UC1);
        assert_eq!(core::count_non_zero(&mask).unwrap(), 8 * 16);
        assert!(mask.data_bytes().unwrap().iter().all(|&v| v == 0 || v == 255));
    }

    #[test]
    fn test_segmentation_is_idempotent() {
        let mut frame = solid(24, 16, [30.0, 60.0, 90.0]);
        *frame.at_2d_mut::<Vec3b>(3, 5).unwrap() = Vec3b::from_array([0, 255, 255]);
        *frame.at_2d_mut::<Vec3b>(10, 20).unwrap() = Vec3b::from_array([170, 170, 170]);

        let config = ColorConfig::default();
        let first = segment_lane_colors(&frame, &config).unwrap();
        let second = segment_lane_colors(&frame, &config).unwrap();
        assert_eq!(
            first.data_bytes().unwrap(),
            second.data_bytes().unwrap()
        );
        assert_eq!(core::count_non_zero(&first).unwrap(), 2);
    }

    #[test]
    fn test_single_channel_input_rejected() {
        let gray =
            Mat::new_rows_cols_with_default(4, 4, CV_8UC1, Scalar::all(0.0)).unwrap();
        assert!(segment_lane_colors(&gray, &ColorConfig::default()).is_err());
    }
}
