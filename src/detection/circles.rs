use image::GrayImage;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::trace;

use crate::config::{ContourParams, HoughParams};
use crate::detection::preprocessing;
use crate::models::Contour;

/// Keep contours shaped like a lit lamp: big enough, round, roughly square
pub fn filter_circles(contours: &[Contour], params: &ContourParams) -> Vec<Contour> {
    contours
        .iter()
        .filter(|c| is_light_shaped(c, params))
        .cloned()
        .collect()
}

pub fn is_light_shaped(contour: &Contour, params: &ContourParams) -> bool {
    let area = contour.area();
    if area < params.min_area {
        trace!(area, "contour rejected: too small");
        return false;
    }

    let circularity = contour.circularity();
    if circularity < params.min_circularity || circularity > params.max_circularity {
        trace!(circularity, "contour rejected: not round");
        return false;
    }

    let aspect = contour.aspect_ratio();
    if aspect < params.min_aspect_ratio || aspect > params.max_aspect_ratio {
        trace!(aspect, "contour rejected: not square");
        return false;
    }

    true
}

/// A circle found by the Hough transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: (i32, i32),
    pub radius: u32,
    pub votes: u32,
}

/// Hough gradient circle detection.
///
/// Every Canny edge pixel votes along its gradient direction, in both senses,
/// for centers at each radius in `min_radius..=max_radius`. Accumulator
/// local maxima above `accumulator_threshold` become candidate centers,
/// strongest first; candidates closer than `min_dist` to an accepted circle
/// are dropped. The radius is the distance most edge pixels share with the
/// center, and it needs `accumulator_threshold` supporting edge pixels too.
pub fn hough_circles(gray: &GrayImage, params: &HoughParams) -> Vec<Circle> {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let edges = preprocessing::detect_edges(gray, params.canny_high);
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);

    let dp = params.dp;
    let acc_w = (width as f32 / dp).ceil() as usize + 1;
    let acc_h = (height as f32 / dp).ceil() as usize + 1;
    let mut acc = vec![0u32; acc_w * acc_h];
    let mut edge_points = Vec::new();

    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        edge_points.push((x as f32, y as f32));

        let dx = gx.get_pixel(x, y)[0] as f32;
        let dy = gy.get_pixel(x, y)[0] as f32;
        let magnitude = (dx * dx + dy * dy).sqrt();
        if magnitude == 0.0 {
            continue;
        }
        let (ux, uy) = (dx / magnitude, dy / magnitude);

        for r in params.min_radius..=params.max_radius {
            for sign in [-1.0f32, 1.0] {
                let cx = ((x as f32 + sign * r as f32 * ux) / dp).round();
                let cy = ((y as f32 + sign * r as f32 * uy) / dp).round();
                if cx < 0.0 || cy < 0.0 || cx as usize >= acc_w || cy as usize >= acc_h {
                    continue;
                }
                acc[cy as usize * acc_w + cx as usize] += 1;
            }
        }
    }

    let mut candidates = local_maxima(&acc, acc_w, acc_h, params.accumulator_threshold);
    // Strongest first; ties broken by raster position so output is stable
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    trace!(edges = edge_points.len(), candidates = candidates.len(), "hough accumulator");

    let min_dist_sq = params.min_dist * params.min_dist;
    let mut circles: Vec<Circle> = Vec::new();

    for (idx, votes) in candidates {
        let cx = ((idx % acc_w) as f32 * dp).min((width - 1) as f32);
        let cy = ((idx / acc_w) as f32 * dp).min((height - 1) as f32);

        let too_close = circles.iter().any(|c| {
            let dx = c.center.0 as f32 - cx;
            let dy = c.center.1 as f32 - cy;
            dx * dx + dy * dy < min_dist_sq
        });
        if too_close {
            continue;
        }

        if let Some(radius) = estimate_radius(&edge_points, (cx, cy), params) {
            circles.push(Circle {
                center: (cx.round() as i32, cy.round() as i32),
                radius,
                votes,
            });
        }
    }

    circles
}

/// Accumulator cells above `threshold` that beat their 4-neighbours.
/// Comparisons are strict on one side only so a flat plateau yields one peak.
fn local_maxima(acc: &[u32], w: usize, h: usize, threshold: u32) -> Vec<(usize, u32)> {
    let mut peaks = Vec::new();
    for y in 1..h.saturating_sub(1) {
        for x in 1..w.saturating_sub(1) {
            let idx = y * w + x;
            let v = acc[idx];
            if v > threshold
                && v > acc[idx - 1]
                && v >= acc[idx + 1]
                && v > acc[idx - w]
                && v >= acc[idx + w]
            {
                peaks.push((idx, v));
            }
        }
    }
    peaks
}

fn estimate_radius(edge_points: &[(f32, f32)], center: (f32, f32), params: &HoughParams) -> Option<u32> {
    let max_r = params.max_radius as usize;
    let mut hist = vec![0u32; max_r + 2];

    for &(x, y) in edge_points {
        let dx = x - center.0;
        let dy = y - center.1;
        let r = (dx * dx + dy * dy).sqrt().round() as usize;
        if r <= max_r + 1 {
            hist[r] += 1;
        }
    }

    let min_r = params.min_radius as usize;
    let (best, _) = (min_r..=max_r)
        .map(|r| (r, hist[r]))
        .fold((min_r, 0), |best, cur| if cur.1 > best.1 { cur } else { best });

    // A digitised ring spreads over neighbouring integer radii
    let below = best.checked_sub(1).map_or(0, |r| hist[r]);
    let support = below + hist[best] + hist[best + 1];
    if support >= params.accumulator_threshold {
        Some(best as u32)
    } else {
        None
    }
}
