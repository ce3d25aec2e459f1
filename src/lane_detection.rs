use crate::types::{HoughConfig, LaneDetection, LaneLine, LineModel, Segment};
use anyhow::Result;
use opencv::{
    core::{Mat, Vec4i, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

/// Probabilistic Hough over a filtered edge mask.
pub fn detect_segments(edges: &Mat, config: &HoughConfig) -> Result<Vec<Segment>> {
    let mut lines = Vector::<Vec4i>::new();
    imgproc::hough_lines_p(
        edges,
        &mut lines,
        config.dist_resolution,
        config.angle_resolution,
        config.vote_threshold,
        config.min_segment_length,
        config.max_segment_gap,
    )?;

    let segments: Vec<Segment> = lines
        .iter()
        .map(|l| Segment::new(l[0], l[1], l[2], l[3]))
        .collect();

    debug!("Hough: {} segment(s)", segments.len());
    Ok(segments)
}

/// Least-squares degree-1 fit over `points`.
///
/// Returns `None` when all x coordinates coincide (vertical line), when the
/// fit is horizontal, or when fewer than two points are given. Such lines
/// cannot be reconstructed from a row coordinate.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LineModel> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for &(x, y) in points {
        sxx += (x - mean_x) * (x - mean_x);
        sxy += (x - mean_x) * (y - mean_y);
    }

    if sxx.abs() < f64::EPSILON {
        return None;
    }

    let slope = sxy / sxx;
    if slope == 0.0 || !slope.is_finite() {
        return None;
    }

    Some(LineModel {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

pub fn fit_segment(segment: &Segment) -> Option<LineModel> {
    fit_line(&[
        (segment.x1 as f64, segment.y1 as f64),
        (segment.x2 as f64, segment.y2 as f64),
    ])
}

/// Element-wise mean of slope and intercept.
pub fn average_models(models: &[LineModel]) -> Option<LineModel> {
    if models.is_empty() {
        return None;
    }
    let n = models.len() as f64;
    Some(LineModel {
        slope: models.iter().map(|m| m.slope).sum::<f64>() / n,
        intercept: models.iter().map(|m| m.intercept).sum::<f64>() / n,
    })
}

/// Endpoints of `model` between the bottom row and `top_ratio * height`.
///
/// x is floor-divided, matching `floor((y - intercept) / slope)`. Returns
/// `None` for a zero slope or when a coordinate does not fit in `i32`.
pub fn make_points(model: &LineModel, height: i32, top_ratio: f64) -> Option<LaneLine> {
    if model.slope == 0.0 {
        return None;
    }

    let y1 = height;
    let y2 = (height as f64 * top_ratio) as i32;

    let x_at = |y: i32| -> Option<i32> {
        let x = ((y as f64 - model.intercept) / model.slope).floor();
        if x.is_finite() && x >= i32::MIN as f64 && x <= i32::MAX as f64 {
            Some(x as i32)
        } else {
            None
        }
    };

    Some(LaneLine {
        x1: x_at(y1)?,
        y1,
        x2: x_at(y2)?,
        y2,
    })
}

/// Splits segments by slope sign and averages each side.
///
/// Image y grows downward, so the left lane rises to the right with a
/// negative slope and the right lane has a positive one.
pub fn average_lanes(segments: &[Segment], height: i32, top_ratio: f64) -> LaneDetection {
    let mut left = Vec::new();
    let mut right = Vec::new();

    for segment in segments {
        match fit_segment(segment) {
            Some(model) if model.slope < 0.0 => left.push(model),
            Some(model) => right.push(model),
            None => debug!("Skipping degenerate segment {:?}", segment),
        }
    }

    let side = |models: &[LineModel]| {
        average_models(models).and_then(|avg| make_points(&avg, height, top_ratio))
    };

    let detection = LaneDetection::from_sides(side(&left), side(&right));
    debug!(
        "Lanes: {} left / {} right candidate(s) -> {}",
        left.len(),
        right.len(),
        detection.as_str()
    );
    detection
}
