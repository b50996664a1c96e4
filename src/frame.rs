use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

/// Channel order of the raw bytes a frame was built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    Bgr,
}

/// A 3-channel, 8-bit raster.
///
/// Pixels are always held in RGB order; `order` records how the caller
/// delivered them so [`Frame::to_raw`] can hand back the same encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
    order: ChannelOrder,
}

impl Frame {
    /// Wrap an RGB image
    pub fn from_rgb(image: RgbImage) -> DetectResult<Self> {
        check_dimensions(image.width(), image.height())?;
        Ok(Self {
            image,
            order: ChannelOrder::Rgb,
        })
    }

    /// Build a frame from a decoded image. Only 3-channel images are accepted.
    pub fn from_image(img: &DynamicImage) -> DetectResult<Self> {
        let channels = img.color().channel_count();
        if channels != 3 {
            return Err(DetectError::InvalidFrameFormat { channels });
        }

        let rgb = match img {
            DynamicImage::ImageRgb8(rgb) => rgb.clone(),
            other => other.to_rgb8(),
        };
        Self::from_rgb(rgb)
    }

    /// Build a frame from an interleaved byte buffer, e.g. a webcam capture
    pub fn from_raw(
        width: u32,
        height: u32,
        channels: u8,
        order: ChannelOrder,
        mut data: Vec<u8>,
    ) -> DetectResult<Self> {
        if channels != 3 {
            return Err(DetectError::InvalidFrameFormat { channels });
        }
        check_dimensions(width, height)?;

        let expected = width as usize * height as usize * 3;
        let actual = data.len();
        if actual != expected {
            return Err(DetectError::BufferSize { expected, actual });
        }

        if order == ChannelOrder::Bgr {
            swap_red_blue(&mut data);
        }

        let image = RgbImage::from_raw(width, height, data)
            .ok_or(DetectError::BufferSize { expected, actual })?;
        Ok(Self { image, order })
    }

    /// Same pixels, different backing image; keeps the channel order
    pub(crate) fn with_image(&self, image: RgbImage) -> Self {
        Self {
            image,
            order: self.order,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Pixels in RGB order regardless of the source encoding
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    /// Interleaved bytes in the frame's source channel order
    pub fn to_raw(&self) -> Vec<u8> {
        let mut data = self.image.as_raw().clone();
        if self.order == ChannelOrder::Bgr {
            swap_red_blue(&mut data);
        }
        data
    }
}

fn check_dimensions(width: u32, height: u32) -> DetectResult<()> {
    if width == 0 || height == 0 {
        return Err(DetectError::EmptyFrame { width, height });
    }
    Ok(())
}

fn swap_red_blue(data: &mut [u8]) {
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb, RgbaImage};

    #[test]
    fn rejects_non_three_channel_images() {
        let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert_eq!(
            Frame::from_image(&gray),
            Err(DetectError::InvalidFrameFormat { channels: 1 })
        );

        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
        assert_eq!(
            Frame::from_image(&rgba),
            Err(DetectError::InvalidFrameFormat { channels: 4 })
        );
    }

    #[test]
    fn rejects_empty_frames() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        assert_eq!(
            Frame::from_image(&empty),
            Err(DetectError::EmptyFrame { width: 0, height: 10 })
        );
    }

    #[test]
    fn bgr_buffers_round_trip_in_source_order() {
        let bgr = vec![10, 20, 30, 40, 50, 60];
        let frame = Frame::from_raw(2, 1, 3, ChannelOrder::Bgr, bgr.clone()).unwrap();

        assert_eq!(*frame.as_rgb().get_pixel(0, 0), Rgb([30, 20, 10]));
        assert_eq!(frame.to_raw(), bgr);
    }

    #[test]
    fn raw_buffer_length_is_checked() {
        let err = Frame::from_raw(2, 2, 3, ChannelOrder::Rgb, vec![0; 5]).unwrap_err();
        assert_eq!(err, DetectError::BufferSize { expected: 12, actual: 5 });
    }
}
