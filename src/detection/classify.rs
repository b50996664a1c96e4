use image::{GrayImage, Luma};
use imageproc::filter::median_filter;

use crate::config::{ClassifierParams, ColorBands};
use crate::detection::preprocessing::HsvImage;
use crate::models::{BandCounts, BoundingBox, LightColor, Region};

/// Count, per colour band, the HSV pixels under `mask`.
///
/// `mask` covers `bounds` (already clipped to the frame), see [`Region::mask`].
/// Every masked pixel adds to `total`; with a `premask` only pixels it also
/// keeps are checked against the bands.
pub fn count_band_pixels(
    hsv: &HsvImage,
    mask: &GrayImage,
    bounds: &BoundingBox,
    bands: &ColorBands,
    premask: Option<&GrayImage>,
) -> BandCounts {
    let mut counts = BandCounts::default();

    for (x, y, m) in mask.enumerate_pixels() {
        if m[0] == 0 {
            continue;
        }
        counts.total += 1;
        if premask.is_some_and(|p| p.get_pixel(x, y)[0] == 0) {
            continue;
        }

        let px = hsv.get_pixel(bounds.x + x, bounds.y + y).0;
        for (color, band) in bands.iter() {
            if band.contains(px) {
                counts.add(color);
            }
        }
    }

    counts
}

/// Saturated, bright pixels of the region, median-filtered to drop speckle
pub fn saturation_premask(
    hsv: &HsvImage,
    mask: &GrayImage,
    bounds: &BoundingBox,
    params: &ClassifierParams,
) -> GrayImage {
    let raw = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        let [_, s, v] = hsv.get_pixel(bounds.x + x, bounds.y + y).0;
        if mask.get_pixel(x, y)[0] > 0 && s >= params.min_saturation && v >= params.min_value {
            Luma([255])
        } else {
            Luma([0])
        }
    });
    let r = params.premask_median_radius;
    if r == 0 {
        return raw;
    }
    median_filter(&raw, r, r)
}

/// Pick the dominant colour from band counts.
///
/// The winner needs strictly more than `min_pixels` pixels and, when
/// `min_pixel_fraction` is set, that share of the region. Equal counts go
/// to the earlier colour in red > yellow > green order, so an ambiguous
/// lamp is read as the more restrictive signal.
pub fn dominant_color(counts: &BandCounts, params: &ClassifierParams) -> Option<LightColor> {
    let mut best: Option<(LightColor, u32)> = None;
    for color in LightColor::ALL {
        let n = counts.get(color);
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((color, n));
        }
    }

    let (color, n) = best?;
    if n <= params.min_pixels {
        return None;
    }
    if params.min_pixel_fraction > 0.0
        && (n as f32) < params.min_pixel_fraction * counts.total as f32
    {
        return None;
    }
    Some(color)
}

/// Classify a region of the HSV frame.
///
/// A non-zero `min_pixel_fraction` also enables the saturation/value pre-mask.
pub fn classify_region(
    hsv: &HsvImage,
    region: &Region,
    bounds: &BoundingBox,
    bands: &ColorBands,
    params: &ClassifierParams,
) -> (Option<LightColor>, BandCounts) {
    let mask = region.mask(bounds);
    let premask =
        (params.min_pixel_fraction > 0.0).then(|| saturation_premask(hsv, &mask, bounds, params));
    let counts = count_band_pixels(hsv, &mask, bounds, bands, premask.as_ref());
    (dominant_color(&counts, params), counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn counts(red: u32, yellow: u32, green: u32) -> BandCounts {
        BandCounts {
            red,
            yellow,
            green,
            total: red + yellow + green,
        }
    }

    #[test]
    fn below_threshold_is_unclassified() {
        let params = ClassifierParams::default();
        assert_eq!(dominant_color(&counts(50, 0, 0), &params), None);
        assert_eq!(dominant_color(&counts(51, 0, 0), &params), Some(LightColor::Red));
        assert_eq!(dominant_color(&BandCounts::default(), &params), None);
    }

    #[test]
    fn ties_prefer_the_more_restrictive_color() {
        let params = ClassifierParams::default();
        assert_eq!(dominant_color(&counts(80, 80, 80), &params), Some(LightColor::Red));
        assert_eq!(dominant_color(&counts(0, 90, 90), &params), Some(LightColor::Yellow));
        assert_eq!(dominant_color(&counts(10, 20, 90), &params), Some(LightColor::Green));
    }

    #[test]
    fn fraction_gate() {
        let params = ClassifierParams {
            min_pixels: 10,
            min_pixel_fraction: 0.3,
            ..ClassifierParams::default()
        };
        let mut c = counts(0, 0, 60);
        c.total = 400;
        assert_eq!(dominant_color(&c, &params), None);
        c.total = 150;
        assert_eq!(dominant_color(&c, &params), Some(LightColor::Green));
    }

    const HSV_RED: [u8; 3] = [0, 255, 255];
    const HSV_HOUSING: [u8; 3] = [0, 0, 20];

    /// Red pixels on every third row and column, dark elsewhere
    fn speckled(size: u32) -> HsvImage {
        HsvImage::from_fn(size, size, |x, y| {
            if x % 3 == 0 && y % 3 == 0 {
                Rgb(HSV_RED)
            } else {
                Rgb(HSV_HOUSING)
            }
        })
    }

    fn lamp(size: u32, radius: i64) -> HsvImage {
        let c = size as i64 / 2;
        HsvImage::from_fn(size, size, |x, y| {
            let (dx, dy) = (x as i64 - c, y as i64 - c);
            if dx * dx + dy * dy <= radius * radius {
                Rgb(HSV_RED)
            } else {
                Rgb(HSV_HOUSING)
            }
        })
    }

    fn centred_circle(size: u32, radius: u32) -> (Region, BoundingBox) {
        let c = size as i32 / 2;
        let region = Region::Circle {
            center: (c, c),
            radius,
        };
        let bounds = region.clipped_bounds(size, size).unwrap();
        (region, bounds)
    }

    #[test]
    fn counts_only_pixels_inside_the_region() {
        let hsv = lamp(41, 10);
        let (region, bounds) = centred_circle(41, 10);

        let bands = ColorBands::default();
        let params = ClassifierParams::default();

        let (color, evidence) = classify_region(&hsv, &region, &bounds, &bands, &params);
        assert_eq!(color, Some(LightColor::Red));
        assert_eq!(evidence.red, evidence.total);
        assert_eq!(evidence.yellow + evidence.green, 0);
    }

    #[test]
    fn premask_drops_speckle_when_fraction_gate_is_on() {
        let hsv = speckled(61);
        let (region, bounds) = centred_circle(61, 30);
        let bands = ColorBands::default();

        let plain = ClassifierParams {
            min_pixel_fraction: 0.0,
            ..ClassifierParams::default()
        };
        let (color, evidence) = classify_region(&hsv, &region, &bounds, &bands, &plain);
        assert_eq!(color, Some(LightColor::Red));
        assert!(evidence.red > 250);

        let gated = ClassifierParams {
            min_pixel_fraction: 0.05,
            ..ClassifierParams::default()
        };
        let (color, evidence) = classify_region(&hsv, &region, &bounds, &bands, &gated);
        assert_eq!(color, None);
        assert_eq!(evidence.red, 0);
        assert!(evidence.total > 2500);
    }

    #[test]
    fn premask_keeps_a_solid_lamp() {
        let hsv = lamp(61, 20);
        let (region, bounds) = centred_circle(61, 25);
        let params = ClassifierParams {
            min_pixel_fraction: 0.3,
            ..ClassifierParams::default()
        };

        let (color, evidence) =
            classify_region(&hsv, &region, &bounds, &ColorBands::default(), &params);
        assert_eq!(color, Some(LightColor::Red));
        // The 5x5 median only erodes the lamp rim
        assert!(evidence.red > 1000);
    }
}
