use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use trafficlight::Frame;

/// Lamp colours chosen to sit well inside the default bands
pub const LAMP_RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const LAMP_YELLOW: Rgb<u8> = Rgb([255, 220, 0]);
pub const LAMP_GREEN: Rgb<u8> = Rgb([0, 255, 0]);
/// Hue 178 in half-degrees, the top end of the red band
pub const LAMP_RED_WRAPPED: Rgb<u8> = Rgb([255, 0, 17]);
/// Hue 2 in half-degrees, the bottom end of the red band
pub const LAMP_RED_LOW: Rgb<u8> = Rgb([255, 17, 0]);

pub const HOUSING: Rgb<u8> = Rgb([20, 20, 20]);

/// Dark frame with the given filled discs: (center x, center y, radius, colour)
pub fn frame_with_discs(width: u32, height: u32, discs: &[(i32, i32, i32, Rgb<u8>)]) -> Frame {
    let mut img = RgbImage::from_pixel(width, height, HOUSING);
    for &(x, y, r, color) in discs {
        draw_filled_circle_mut(&mut img, (x, y), r, color);
    }
    Frame::from_rgb(img).expect("Failed to build test frame")
}

/// Vertical red / yellow / green light, all three lamps lit
pub fn three_lamp_frame() -> Frame {
    frame_with_discs(
        100,
        170,
        &[
            (50, 30, 15, LAMP_RED),
            (50, 85, 15, LAMP_YELLOW),
            (50, 140, 15, LAMP_GREEN),
        ],
    )
}

/// Grey gradient: no pixel has enough saturation for any band
pub fn gray_gradient_frame(width: u32, height: u32) -> Frame {
    let img = RgbImage::from_fn(width, height, |x, _| {
        let v = (x * 255 / width.max(1)) as u8;
        Rgb([v, v, v])
    });
    Frame::from_rgb(img).expect("Failed to build test frame")
}

/// Dark frame with one filled rectangle
pub fn frame_with_bar(width: u32, height: u32, rect: Rect, color: Rgb<u8>) -> Frame {
    let mut img = RgbImage::from_pixel(width, height, HOUSING);
    draw_filled_rect_mut(&mut img, rect, color);
    Frame::from_rgb(img).expect("Failed to build test frame")
}

pub fn circle_pipeline() -> trafficlight::DetectionPipeline {
    let config = trafficlight::DetectorConfig::default().with_strategy(trafficlight::Strategy::Circle);
    trafficlight::DetectionPipeline::new(config).expect("Failed to build circle pipeline")
}
