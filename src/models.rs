use std::fmt;

use image::{GrayImage, Luma, Rgb};
use imageproc::drawing::draw_polygon_mut;
use imageproc::geometry::arc_length;
use imageproc::point::Point;
use serde::Serialize;

/// A traffic light colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LightColor {
    Red,
    Yellow,
    Green,
}

impl LightColor {
    /// Priority order: when in doubt, assume stop
    pub const ALL: [LightColor; 3] = [LightColor::Red, LightColor::Yellow, LightColor::Green];

    pub fn label(&self) -> &'static str {
        match self {
            LightColor::Red => "RED",
            LightColor::Yellow => "YELLOW",
            LightColor::Green => "GREEN",
        }
    }

    /// Colour used to draw annotations
    pub fn draw_color(&self) -> Rgb<u8> {
        match self {
            LightColor::Red => Rgb([255, 0, 0]),
            LightColor::Yellow => Rgb([255, 255, 0]),
            LightColor::Green => Rgb([0, 255, 0]),
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LightColor::Red => "red",
            LightColor::Yellow => "yellow",
            LightColor::Green => "green",
        };
        f.write_str(name)
    }
}

/// Frame-level traffic light state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameStatus {
    #[serde(rename = "STOP")]
    Stop,
    #[serde(rename = "WAIT")]
    Wait,
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "TEST")]
    Test,
    #[serde(rename = "NO LIGHT DETECTED")]
    NoLight,
}

impl FrameStatus {
    pub fn for_color(color: LightColor) -> Self {
        match color {
            LightColor::Red => FrameStatus::Stop,
            LightColor::Yellow => FrameStatus::Wait,
            LightColor::Green => FrameStatus::Go,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameStatus::Stop => "STOP",
            FrameStatus::Wait => "WAIT",
            FrameStatus::Go => "GO",
            FrameStatus::Test => "TEST",
            FrameStatus::NoLight => "NO LIGHT DETECTED",
        }
    }
}

impl fmt::Display for FrameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned box in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// External boundary of a connected blob in a binary mask
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            points,
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn width(&self) -> u32 {
        (self.max_x - self.min_x + 1) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y - self.min_y + 1) as u32
    }

    /// Enclosed area of the boundary polygon (shoelace formula)
    pub fn area(&self) -> f32 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64
            })
            .sum();
        (twice.abs() as f32) / 2.0
    }

    pub fn perimeter(&self) -> f32 {
        arc_length(&self.points, true) as f32
    }

    /// 4π·area / perimeter², 1.0 for an ideal circle
    pub fn circularity(&self) -> f32 {
        let perimeter = self.perimeter();
        if perimeter == 0.0 {
            return 0.0;
        }
        4.0 * std::f32::consts::PI * self.area() / (perimeter * perimeter)
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() as f32 / self.height() as f32
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.min_x + self.max_x) / 2, (self.min_y + self.max_y) / 2)
    }
}

/// A candidate traffic light location
#[derive(Debug, Clone, PartialEq)]
pub enum Region {
    Circle { center: (i32, i32), radius: u32 },
    Contour(Contour),
}

impl Region {
    /// Binary mask (255 = inside) of the region over `bounds`.
    ///
    /// Pixel (0, 0) of the mask is (`bounds.x`, `bounds.y`) in the frame.
    /// Contour regions are filled polygons with their boundary included.
    pub fn mask(&self, bounds: &BoundingBox) -> GrayImage {
        let (ox, oy) = (bounds.x as i32, bounds.y as i32);
        match self {
            Region::Circle { center, radius } => {
                let r = *radius as i64;
                GrayImage::from_fn(bounds.width, bounds.height, |x, y| {
                    let dx = (x as i32 + ox - center.0) as i64;
                    let dy = (y as i32 + oy - center.1) as i64;
                    if dx * dx + dy * dy <= r * r {
                        Luma([255])
                    } else {
                        Luma([0])
                    }
                })
            }
            Region::Contour(contour) => {
                let mut mask = GrayImage::new(bounds.width, bounds.height);
                let mut poly: Vec<Point<i32>> = contour
                    .points
                    .iter()
                    .map(|p| Point::new(p.x - ox, p.y - oy))
                    .collect();
                poly.dedup();
                while poly.len() > 1 && poly.first() == poly.last() {
                    poly.pop();
                }
                if poly.len() >= 3 {
                    draw_polygon_mut(&mut mask, &poly, Luma([255]));
                }
                for p in &poly {
                    if p.x >= 0
                        && p.y >= 0
                        && (p.x as u32) < bounds.width
                        && (p.y as u32) < bounds.height
                    {
                        mask.put_pixel(p.x as u32, p.y as u32, Luma([255]));
                    }
                }
                mask
            }
        }
    }

    /// Bounding box clipped to a `width` x `height` frame, None when the
    /// region lies entirely outside it
    pub fn clipped_bounds(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let (min_x, min_y, max_x, max_y) = match self {
            Region::Circle { center, radius } => {
                let r = *radius as i32;
                (center.0 - r, center.1 - r, center.0 + r, center.1 + r)
            }
            Region::Contour(c) => (c.min_x, c.min_y, c.max_x, c.max_y),
        };

        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(width as i32 - 1);
        let max_y = max_y.min(height as i32 - 1);
        if min_x > max_x || min_y > max_y {
            return None;
        }

        Some(BoundingBox {
            x: min_x as u32,
            y: min_y as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

/// Per-band pixel counts inside one region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub red: u32,
    pub yellow: u32,
    pub green: u32,
    /// In-frame pixels covered by the region
    pub total: u32,
}

impl BandCounts {
    pub fn get(&self, color: LightColor) -> u32 {
        match color {
            LightColor::Red => self.red,
            LightColor::Yellow => self.yellow,
            LightColor::Green => self.green,
        }
    }

    pub(crate) fn add(&mut self, color: LightColor) {
        match color {
            LightColor::Red => self.red += 1,
            LightColor::Yellow => self.yellow += 1,
            LightColor::Green => self.green += 1,
        }
    }
}

/// A region together with its classification
#[derive(Debug, Clone, PartialEq)]
pub struct RegionResult {
    pub region: Region,
    pub bounds: BoundingBox,
    pub color: Option<LightColor>,
    pub evidence: BandCounts,
}
