use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};
use crate::models::LightColor;

/// Largest hue value in the 8-bit HSV convention (half-degrees)
pub const HUE_MAX: u8 = 180;

/// Inclusive HSV bounds, hue in half-degrees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|i| hsv[i] >= self.lower[i] && hsv[i] <= self.upper[i])
    }
}

/// One traffic light colour as a union of HSV ranges.
/// Red needs two ranges because hue wraps around at 0/180.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    pub ranges: Vec<HsvRange>,
}

impl ColorBand {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        self.ranges.iter().any(|r| r.contains(hsv))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorBands {
    pub red: ColorBand,
    pub yellow: ColorBand,
    pub green: ColorBand,
}

impl ColorBands {
    pub fn get(&self, color: LightColor) -> &ColorBand {
        match color {
            LightColor::Red => &self.red,
            LightColor::Yellow => &self.yellow,
            LightColor::Green => &self.green,
        }
    }

    /// Bands in priority order (red first)
    pub fn iter(&self) -> impl Iterator<Item = (LightColor, &ColorBand)> {
        LightColor::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

impl Default for ColorBands {
    fn default() -> Self {
        Self {
            red: ColorBand {
                ranges: vec![
                    HsvRange::new([0, 120, 70], [10, 255, 255]),
                    HsvRange::new([170, 120, 70], [180, 255, 255]),
                ],
            },
            yellow: ColorBand {
                ranges: vec![HsvRange::new([20, 100, 100], [30, 255, 255])],
            },
            green: ColorBand {
                ranges: vec![HsvRange::new([40, 80, 80], [90, 255, 255])],
            },
        }
    }
}

/// How candidate regions are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Colour masks, morphology and contour shape filtering
    #[default]
    Contour,
    /// Hough circle transform on the blurred grayscale frame
    Circle,
}

/// Smoothing applied before circle detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum BlurKind {
    Gaussian { sigma: f32 },
    Median { radius: u32 },
}

impl Default for BlurKind {
    fn default() -> Self {
        // Roughly a 9x9 kernel
        BlurKind::Gaussian { sigma: 2.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughParams {
    /// Inverse accumulator resolution
    pub dp: f32,
    /// Minimum distance between accepted centers
    pub min_dist: f32,
    /// Upper Canny threshold, the lower one is half of it
    pub canny_high: f32,
    /// Votes a center needs, and edge points a radius needs
    pub accumulator_threshold: u32,
    pub min_radius: u32,
    pub max_radius: u32,
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            dp: 1.0,
            min_dist: 50.0,
            canny_high: 50.0,
            accumulator_threshold: 30,
            min_radius: 5,
            max_radius: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourParams {
    pub min_area: f32,
    pub min_circularity: f32,
    pub max_circularity: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Radius of the square structuring element used for open + close
    pub morph_radius: u8,
}

impl Default for ContourParams {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            min_circularity: 0.6,
            max_circularity: 1.2,
            min_aspect_ratio: 0.7,
            max_aspect_ratio: 1.4,
            morph_radius: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// The dominant band needs strictly more pixels than this
    pub min_pixels: u32,
    /// The dominant band also needs at least this share of the region (0 disables).
    /// When set, only pixels passing the saturation/value pre-mask are counted.
    pub min_pixel_fraction: f32,
    pub min_saturation: u8,
    pub min_value: u8,
    /// Median filter radius applied to the pre-mask (2 gives a 5x5 window)
    pub premask_median_radius: u32,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            min_pixels: 50,
            min_pixel_fraction: 0.0,
            min_saturation: 100,
            min_value: 80,
            premask_median_radius: 2,
        }
    }
}

/// Frame status when exactly two colours are lit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MixedPolicy {
    /// red > yellow > green
    #[default]
    Priority,
    /// Most regions wins, then most pixels, then priority
    Majority,
}

/// Complete, immutable detector configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub strategy: Strategy,
    pub bands: ColorBands,
    pub blur: BlurKind,
    pub hough: HoughParams,
    pub contour: ContourParams,
    pub classifier: ClassifierParams,
    pub mixed_policy: MixedPolicy,
    /// Report circle regions that matched no colour
    pub keep_unclassified: bool,
}

impl DetectorConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: DetectorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn validate(&self) -> DetectResult<()> {
        for (color, band) in self.bands.iter() {
            if band.ranges.is_empty() {
                return Err(config_error(format!("{color} band has no HSV ranges")));
            }
            for range in &band.ranges {
                if range.lower[0] > HUE_MAX || range.upper[0] > HUE_MAX {
                    return Err(config_error(format!(
                        "{color} band hue exceeds {HUE_MAX}: {range:?}"
                    )));
                }
                if (0..3).any(|i| range.lower[i] > range.upper[i]) {
                    return Err(config_error(format!(
                        "{color} band lower bound above upper bound: {range:?}"
                    )));
                }
            }
        }

        match self.blur {
            BlurKind::Gaussian { sigma } if !(sigma > 0.0) => {
                return Err(config_error(format!("blur sigma must be positive, got {sigma}")));
            }
            _ => {}
        }

        let h = &self.hough;
        if h.min_radius == 0 || h.min_radius > h.max_radius {
            return Err(config_error(format!(
                "invalid radius bounds {}..{}",
                h.min_radius, h.max_radius
            )));
        }
        if !(h.dp >= 1.0) {
            return Err(config_error(format!("dp must be at least 1, got {}", h.dp)));
        }
        if !(h.min_dist > 0.0) || !(h.canny_high > 0.0) {
            return Err(config_error("min_dist and canny_high must be positive"));
        }

        let c = &self.contour;
        if !(c.min_circularity > 0.0) || c.min_circularity > c.max_circularity {
            return Err(config_error(format!(
                "invalid circularity band {}..{}",
                c.min_circularity, c.max_circularity
            )));
        }
        if !(c.min_aspect_ratio > 0.0) || c.min_aspect_ratio > c.max_aspect_ratio {
            return Err(config_error(format!(
                "invalid aspect ratio band {}..{}",
                c.min_aspect_ratio, c.max_aspect_ratio
            )));
        }
        if c.min_area < 0.0 {
            return Err(config_error("min_area must not be negative"));
        }

        let fraction = self.classifier.min_pixel_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(config_error(format!(
                "min_pixel_fraction must be within 0..=1, got {fraction}"
            )));
        }

        Ok(())
    }
}

fn config_error(msg: impl Into<String>) -> DetectError {
    DetectError::Configuration(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DetectorConfig::default().validate().is_ok());
    }

    #[test]
    fn red_band_covers_both_ends_of_the_hue_circle() {
        let red = &ColorBands::default().red;
        assert!(red.contains([2, 200, 200]));
        assert!(red.contains([178, 200, 200]));
        assert!(!red.contains([90, 200, 200]));
    }

    #[test]
    fn swapped_radius_bounds_are_rejected() {
        let mut config = DetectorConfig::default();
        config.hough.min_radius = 80;
        assert!(matches!(config.validate(), Err(DetectError::Configuration(_))));
    }
}
