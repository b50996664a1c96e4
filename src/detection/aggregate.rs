use std::collections::BTreeMap;

use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::config::MixedPolicy;
use crate::detection::label;
use crate::frame::Frame;
use crate::models::{FrameStatus, LightColor, Region, RegionResult};

const LABEL_SCALE: u32 = 2;
const BANNER_SCALE: u32 = 3;
const BANNER_PAD: i32 = 10;

/// Summarise per-region colours into one frame status.
///
/// No coloured region gives `NoLight`, one colour maps to its status and all
/// three at once is the `Test` pattern. Two colours are resolved by `policy`.
pub fn frame_status(results: &[RegionResult], policy: MixedPolicy) -> FrameStatus {
    // colour -> (regions, pixels)
    let mut seen: BTreeMap<LightColor, (usize, u64)> = BTreeMap::new();
    for result in results {
        if let Some(color) = result.color {
            let entry = seen.entry(color).or_default();
            entry.0 += 1;
            entry.1 += result.evidence.get(color) as u64;
        }
    }

    match seen.len() {
        0 => FrameStatus::NoLight,
        3 => FrameStatus::Test,
        _ => {
            // BTreeMap iterates in LightColor order, i.e. red first
            let winner = match policy {
                MixedPolicy::Priority => seen.keys().next().copied(),
                MixedPolicy::Majority => seen
                    .iter()
                    .fold(None, |best: Option<(LightColor, (usize, u64))>, (&c, &score)| {
                        match best {
                            Some((_, s)) if s >= score => best,
                            _ => Some((c, score)),
                        }
                    })
                    .map(|(c, _)| c),
            };
            winner.map_or(FrameStatus::NoLight, FrameStatus::for_color)
        }
    }
}

/// Draw region outlines, colour labels and the frame status onto a copy of
/// `frame`. The input frame is left untouched.
pub fn annotate(frame: &Frame, results: &[RegionResult], status: FrameStatus) -> Frame {
    let mut canvas = frame.as_rgb().clone();

    for result in results {
        let Some(color) = result.color else {
            continue;
        };
        let draw = color.draw_color();

        match &result.region {
            Region::Circle { center, radius } => {
                let r = *radius as i32;
                draw_hollow_circle_mut(&mut canvas, *center, r, draw);
                draw_hollow_circle_mut(&mut canvas, *center, r + 1, draw);
            }
            Region::Contour(contour) => {
                let points = &contour.points;
                for (i, a) in points.iter().enumerate() {
                    let b = points[(i + 1) % points.len()];
                    draw_line_segment_mut(
                        &mut canvas,
                        (a.x as f32, a.y as f32),
                        (b.x as f32, b.y as f32),
                        draw,
                    );
                }
            }
        }

        let text = color.label();
        let (_, text_h) = label::text_size(text, LABEL_SCALE);
        let b = &result.bounds;
        let above = b.y as i32 - 6 - text_h as i32;
        let y = if above >= 0 { above } else { (b.y + b.height) as i32 + 6 };
        label::draw_text(&mut canvas, text, b.x as i32, y, LABEL_SCALE, draw);
    }

    if status != FrameStatus::NoLight {
        let text = status.as_str();
        let (tw, th) = label::text_size(text, BANNER_SCALE);
        let tx = canvas.width() as i32 - tw as i32 - 2 * BANNER_PAD;
        let ty = 2 * BANNER_PAD;
        let banner = Rect::at(tx - BANNER_PAD, ty - BANNER_PAD)
            .of_size(tw + 2 * BANNER_PAD as u32, th + 2 * BANNER_PAD as u32);
        draw_filled_rect_mut(&mut canvas, banner, Rgb([0, 0, 0]));
        label::draw_text(&mut canvas, text, tx, ty, BANNER_SCALE, Rgb([255, 255, 255]));
    }

    frame.with_image(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BandCounts, BoundingBox};

    fn result(color: Option<LightColor>, pixels: u32) -> RegionResult {
        let mut evidence = BandCounts::default();
        if let Some(c) = color {
            for _ in 0..pixels {
                evidence.add(c);
            }
        }
        RegionResult {
            region: Region::Circle {
                center: (10, 10),
                radius: 5,
            },
            bounds: BoundingBox {
                x: 5,
                y: 5,
                width: 11,
                height: 11,
            },
            color,
            evidence,
        }
    }

    #[test]
    fn empty_and_unclassified_frames_have_no_light() {
        assert_eq!(frame_status(&[], MixedPolicy::Priority), FrameStatus::NoLight);
        assert_eq!(
            frame_status(&[result(None, 0)], MixedPolicy::Priority),
            FrameStatus::NoLight
        );
    }

    #[test]
    fn single_color_maps_directly() {
        let results = [result(Some(LightColor::Green), 80), result(Some(LightColor::Green), 90)];
        assert_eq!(frame_status(&results, MixedPolicy::Priority), FrameStatus::Go);
    }

    #[test]
    fn three_colors_is_test_pattern() {
        let results = [
            result(Some(LightColor::Green), 80),
            result(Some(LightColor::Red), 80),
            result(Some(LightColor::Yellow), 80),
        ];
        assert_eq!(frame_status(&results, MixedPolicy::Majority), FrameStatus::Test);
    }

    #[test]
    fn two_colors_follow_policy() {
        let results = [
            result(Some(LightColor::Green), 300),
            result(Some(LightColor::Green), 300),
            result(Some(LightColor::Yellow), 60),
        ];
        assert_eq!(frame_status(&results, MixedPolicy::Priority), FrameStatus::Wait);
        assert_eq!(frame_status(&results, MixedPolicy::Majority), FrameStatus::Go);
    }

    #[test]
    fn majority_ties_fall_back_to_priority() {
        let results = [result(Some(LightColor::Green), 100), result(Some(LightColor::Red), 100)];
        assert_eq!(frame_status(&results, MixedPolicy::Majority), FrameStatus::Stop);
    }
}
