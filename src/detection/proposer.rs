use image::GrayImage;
use tracing::debug;

use crate::config::{BlurKind, ColorBands, ContourParams, HoughParams};
use crate::detection::{circles, contours, preprocessing};
use crate::detection::preprocessing::HsvImage;
use crate::frame::Frame;
use crate::models::{LightColor, Region};

/// A candidate region, optionally already tagged with the band it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub region: Region,
    pub tag: Option<LightColor>,
}

/// Inputs shared by every proposer for one frame
pub struct PreparedFrame<'a> {
    pub frame: &'a Frame,
    pub hsv: &'a HsvImage,
}

/// Strategy that locates candidate traffic light lamps in a frame
pub trait RegionProposer: Send + Sync {
    fn propose(&self, input: &PreparedFrame<'_>) -> Vec<Proposal>;

    /// Human-readable name, used in log output
    fn name(&self) -> &str;
}

/// Colour-mask contour proposer.
///
/// Builds one mask per band, cleans it with open + close, and keeps the
/// external contours that look like a lamp. Proposals are tagged with the
/// band, so classification only confirms them.
pub struct ContourProposer {
    pub bands: ColorBands,
    pub params: ContourParams,
}

impl ContourProposer {
    /// Cleaned binary mask for every band, in priority order
    pub fn masks(&self, hsv: &HsvImage) -> Vec<(LightColor, GrayImage)> {
        self.bands
            .iter()
            .map(|(color, band)| {
                let raw = preprocessing::band_mask(hsv, band);
                (color, preprocessing::clean_mask(&raw, self.params.morph_radius))
            })
            .collect()
    }
}

impl RegionProposer for ContourProposer {
    fn propose(&self, input: &PreparedFrame<'_>) -> Vec<Proposal> {
        let mut proposals = Vec::new();

        for (color, mask) in self.masks(input.hsv) {
            let found = contours::find_external_contours(&mask);
            let kept = circles::filter_circles(&found, &self.params);
            debug!(%color, contours = found.len(), kept = kept.len(), "band contours");

            proposals.extend(kept.into_iter().map(|c| Proposal {
                region: Region::Contour(c),
                tag: Some(color),
            }));
        }

        proposals
    }

    fn name(&self) -> &str {
        "Contour"
    }
}

/// Hough circle proposer on the blurred grayscale frame. Proposals are
/// untagged and classified by pixel voting.
pub struct CircleProposer {
    pub blur: BlurKind,
    pub params: HoughParams,
}

impl RegionProposer for CircleProposer {
    fn propose(&self, input: &PreparedFrame<'_>) -> Vec<Proposal> {
        let gray = preprocessing::to_grayscale(input.frame);
        let blurred = preprocessing::apply_blur(&gray, self.blur);
        let found = circles::hough_circles(&blurred, &self.params);
        debug!(circles = found.len(), "hough circles");

        found
            .into_iter()
            .map(|c| Proposal {
                region: Region::Circle {
                    center: c.center,
                    radius: c.radius,
                },
                tag: None,
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Circle"
    }
}
