use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::models::Contour;

/// Find the external contours of the white blobs in a binary mask.
/// Hole borders and blobs nested inside holes are skipped.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Contour::new(c.points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn ring_yields_a_single_external_contour() {
        let mut mask = GrayImage::new(40, 40);
        draw_filled_rect_mut(&mut mask, Rect::at(5, 5).of_size(30, 30), Luma([255]));
        draw_filled_rect_mut(&mut mask, Rect::at(12, 12).of_size(16, 16), Luma([0]));
        draw_filled_rect_mut(&mut mask, Rect::at(17, 17).of_size(5, 5), Luma([255]));

        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!((contours[0].min_x, contours[0].max_x), (5, 34));
    }
}
