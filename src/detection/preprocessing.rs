use image::{GrayImage, ImageBuffer, Luma, Rgb};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::{close, open};

use crate::config::{BlurKind, ColorBand};
use crate::frame::Frame;

/// HSV raster: channel 0 is hue in half-degrees (0..180), then saturation and value
pub type HsvImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Convert one RGB pixel to 8-bit HSV
pub fn rgb_to_hsv(px: Rgb<u8>) -> [u8; 3] {
    let [r, g, b] = px.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = (max - min) as f32;

    let v = max;
    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / max as f32).round() as u8
    };

    if delta == 0.0 {
        return [0, s, v];
    }

    let (r, g, b) = (r as f32, g as f32, b as f32);
    let mut h = if max as f32 == r {
        60.0 * (g - b) / delta
    } else if max as f32 == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    // 360 degrees map onto 0..180; a hue of 359.x rounds up to 180 and wraps
    let half = (h / 2.0).round() as u32 % 180;
    [half as u8, s, v]
}

/// Convert a frame to HSV
pub fn to_hsv(frame: &Frame) -> HsvImage {
    let rgb = frame.as_rgb();
    HsvImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        Rgb(rgb_to_hsv(*rgb.get_pixel(x, y)))
    })
}

/// Convert a frame to grayscale with BT.601 luma weights.
///
/// Rec.709 weights leave a saturated red lamp too dark against its housing
/// for the edge detector to find.
pub fn to_grayscale(frame: &Frame) -> GrayImage {
    let rgb = frame.as_rgb();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma_601(r, g, b)])
    })
}

fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

/// Smooth a grayscale image to suppress high-frequency noise
pub fn apply_blur(img: &GrayImage, blur: BlurKind) -> GrayImage {
    match blur {
        BlurKind::Gaussian { sigma } => gaussian_blur_f32(img, sigma),
        BlurKind::Median { radius } => median_filter(img, radius, radius),
    }
}

/// Detect edges using Canny; the low threshold is half the high one
pub fn detect_edges(img: &GrayImage, high_threshold: f32) -> GrayImage {
    canny(img, high_threshold / 2.0, high_threshold)
}

/// Binary mask (255 = inside) of the pixels falling into a colour band
pub fn band_mask(hsv: &HsvImage, band: &ColorBand) -> GrayImage {
    GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
        if band.contains(hsv.get_pixel(x, y).0) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Morphological open then close to drop speckles and fill pinholes
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let opened = open(mask, Norm::LInf, radius);
    close(&opened, Norm::LInf, radius)
}
