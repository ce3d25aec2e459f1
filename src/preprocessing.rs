// src/preprocessing.rs

use anyhow::Result;
use opencv::{
    core::{self, Mat, Point, Scalar, Size, Vector},
    imgproc,
    prelude::*,
};

use crate::types::{EdgeConfig, RegionConfig};

/// Gaussian blur followed by Canny. Sigma 0 lets OpenCV derive it from the
/// kernel size.
pub fn extract_edges(mask: &Mat, config: &EdgeConfig) -> Result<Mat> {
    let k = config.blur_kernel_size;

    let mut blurred = Mat::default();
    imgproc::gaussian_blur(
        mask,
        &mut blurred,
        Size::new(k, k),
        0.0,
        0.0,
        core::BORDER_DEFAULT,
    )?;

    let mut edges = Mat::default();
    imgproc::canny(
        &blurred,
        &mut edges,
        config.canny_low,
        config.canny_high,
        3,
        false,
    )?;

    Ok(edges)
}

/// Triangle spanning the full bottom edge with its apex at the horizontal
/// center: `(0, H), (W/2, apex_y), (W, H)`.
pub fn region_of_interest(width: i32, height: i32, config: &RegionConfig) -> [Point; 3] {
    let apex_y = (height as f64 * config.apex_y_ratio) as i32;
    [
        Point::new(0, height),
        Point::new(width / 2, apex_y),
        Point::new(width, height),
    ]
}

/// Zeroes every pixel outside the region of interest.
pub fn apply_region_mask(edges: &Mat, config: &RegionConfig) -> Result<Mat> {
    let triangle = region_of_interest(edges.cols(), edges.rows(), config);

    let mut region = Mat::new_size_with_default(edges.size()?, edges.typ(), Scalar::all(0.0))?;
    let mut polygons = Vector::<Vector<Point>>::new();
    polygons.push(Vector::from_iter(triangle));
    imgproc::fill_poly(
        &mut region,
        &polygons,
        Scalar::all(255.0),
        imgproc::LINE_8,
        0,
        Point::new(0, 0),
    )?;

    let mut masked = Mat::default();
    core::bitwise_and(edges, &region, &mut masked, &core::no_array())?;
    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Rect, CV_8UC1};

    fn filled(width: i32, height: i32, value: f64) -> Mat {
        Mat::new_rows_cols_with_default(height, width, CV_8UC1, Scalar::all(value)).unwrap()
    }

    /// Left and right x of the triangle edges at row `y`.
    fn edge_bounds(width: i32, height: i32, y: i32) -> (f64, f64) {
        let apex_x = (width / 2) as f64;
        let apex_y = (height / 2) as f64;
        let t = (y as f64 - apex_y) / (height as f64 - apex_y);
        let left = apex_x * (1.0 - t);
        let right = apex_x + (width as f64 - apex_x) * t;
        (left, right)
    }

    #[test]
    fn test_region_filter_zeroes_outside_triangle() {
        // Edge rasterization stays within a pixel for these aspect ratios.
        let tolerance = 1.0;
        for &(w, h) in &[(2, 2), (3, 7), (64, 48), (101, 77), (160, 90)] {
            let out = apply_region_mask(&filled(w, h, 255.0), &RegionConfig::default()).unwrap();
            assert_eq!(out.rows(), h);
            assert_eq!(out.cols(), w);

            for y in 0..h {
                for x in 0..w {
                    let outside = if y < h / 2 - 1 {
                        true
                    } else if y < h / 2 {
                        false
                    } else {
                        let (left, right) = edge_bounds(w, h, y);
                        (x as f64) < left - tolerance || (x as f64) > right + tolerance
                    };
                    if outside {
                        assert_eq!(
                            *out.at_2d::<u8>(y, x).unwrap(),
                            0,
                            "pixel ({}, {}) outside the triangle for {}x{}",
                            x,
                            y,
                            w,
                            h
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_region_filter_keeps_values_unchanged() {
        let out = apply_region_mask(&filled(40, 40, 77.0), &RegionConfig::default()).unwrap();
        assert_eq!(*out.at_2d::<u8>(39, 20).unwrap(), 77);
    }

    #[test]
    fn test_edges_of_blank_mask_are_empty() {
        let edges = extract_edges(&filled(64, 64, 0.0), &EdgeConfig::default()).unwrap();
        assert_eq!(core::count_non_zero(&edges).unwrap(), 0);
    }

    #[test]
    fn test_edges_trace_block_outline() {
        let mut mask = filled(64, 64, 0.0);
        imgproc::rectangle(
            &mut mask,
            Rect::new(20, 10, 12, 40),
            Scalar::all(255.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();

        let edges = extract_edges(&mask, &EdgeConfig::default()).unwrap();
        assert_eq!(edges.typ(), CV_8UC1);
        assert!(core::count_non_zero(&edges).unwrap() > 0);
        // Interior and far background carry no gradient.
        assert_eq!(*edges.at_2d::<u8>(30, 26).unwrap(), 0);
        assert_eq!(*edges.at_2d::<u8>(30, 60).unwrap(), 0);
        assert!(edges.data_bytes().unwrap().iter().all(|&v| v == 0 || v == 255));
    }
}
