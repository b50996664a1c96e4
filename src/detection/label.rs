//! Minimal 5x7 bitmap text, enough for colour names and frame statuses.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const GLYPH_W: i32 = 5;
const GLYPH_H: i32 = 7;

fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        _ => [0; 7],
    }
}

/// Pixel size of `text` rendered at `scale`
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let n = text.chars().count() as u32;
    if n == 0 {
        return (0, 0);
    }
    let s = scale.max(1);
    ((n * (GLYPH_W as u32 + 1) - 1) * s, GLYPH_H as u32 * s)
}

/// Draw `text` with its top-left corner at (x, y). Pixels outside the
/// canvas are clipped.
pub fn draw_text(canvas: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let s = scale.max(1) as i32;
    for (i, c) in text.chars().enumerate() {
        let origin_x = x + i as i32 * (GLYPH_W + 1) * s;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                let rect = Rect::at(origin_x + col * s, y + row as i32 * s).of_size(s as u32, s as u32);
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_accounts_for_spacing_and_scale() {
        assert_eq!(text_size("GO", 1), (11, 7));
        assert_eq!(text_size("GO", 2), (22, 14));
        assert_eq!(text_size("", 2), (0, 0));
    }

    #[test]
    fn draws_inside_and_clips_outside() {
        let mut img = RgbImage::new(8, 8);
        draw_text(&mut img, "T", 0, 0, 1, Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(2, 0), Rgb([255, 255, 255]));
        assert_eq!(*img.get_pixel(0, 1), Rgb([0, 0, 0]));

        draw_text(&mut img, "STOP", -20, 4, 2, Rgb([255, 0, 0]));
    }
}
