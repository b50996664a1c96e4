pub mod preprocessing;
pub mod contours;
pub mod circles;
pub mod classify;
pub mod aggregate;
pub mod label;
pub mod proposer;

use image::GrayImage;
use tracing::debug;

use crate::config::{DetectorConfig, Strategy};
use crate::error::DetectResult;
use crate::frame::Frame;
use crate::models::{FrameStatus, LightColor, RegionResult};
use proposer::{CircleProposer, ContourProposer, PreparedFrame, Proposal, RegionProposer};

/// Everything produced for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub status: FrameStatus,
    pub annotated: Frame,
    pub regions: Vec<RegionResult>,
}

/// Per-frame traffic light detector.
///
/// Holds only immutable configuration, so one instance can serve frames
/// from several threads at once.
pub struct DetectionPipeline {
    config: DetectorConfig,
    proposer: Box<dyn RegionProposer>,
}

impl DetectionPipeline {
    /// Validate `config` and build the proposer it selects
    pub fn new(config: DetectorConfig) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Assemble a pipeline from an already validated config
    fn build(config: DetectorConfig) -> Self {
        let proposer: Box<dyn RegionProposer> = match config.strategy {
            Strategy::Contour => Box::new(contour_proposer(&config)),
            Strategy::Circle => Box::new(CircleProposer {
                blur: config.blur,
                params: config.hough,
            }),
        };
        Self { config, proposer }
    }

    /// Use a custom region proposer instead of the configured strategy
    pub fn with_proposer(config: DetectorConfig, proposer: Box<dyn RegionProposer>) -> DetectResult<Self> {
        config.validate()?;
        Ok(Self { config, proposer })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run the full detection on one frame
    pub fn detect(&self, frame: &Frame) -> DetectResult<Detection> {
        let hsv = preprocessing::to_hsv(frame);
        let proposals = self.proposer.propose(&PreparedFrame { frame, hsv: &hsv });
        debug!(
            strategy = self.proposer.name(),
            proposals = proposals.len(),
            "regions proposed"
        );

        let mut regions = Vec::with_capacity(proposals.len());
        for Proposal { region, tag } in proposals {
            let Some(bounds) = region.clipped_bounds(frame.width(), frame.height()) else {
                continue;
            };

            let (voted, evidence) = classify::classify_region(
                &hsv,
                &region,
                &bounds,
                &self.config.bands,
                &self.config.classifier,
            );
            // Contour proposals already know their band
            let color = match tag {
                Some(tag) if evidence.total > 0 => Some(tag),
                Some(_) => None,
                None => voted,
            };

            if color.is_none() && !self.config.keep_unclassified {
                continue;
            }
            regions.push(RegionResult {
                region,
                bounds,
                color,
                evidence,
            });
        }

        regions.sort_by_key(|r| (r.bounds.y, r.bounds.x));

        let status = aggregate::frame_status(&regions, self.config.mixed_policy);
        let annotated = aggregate::annotate(frame, &regions, status);
        debug!(%status, regions = regions.len(), "frame classified");

        Ok(Detection {
            status,
            annotated,
            regions,
        })
    }

    /// Decode-side convenience: build the frame from an image and detect
    pub fn detect_image(&self, img: &image::DynamicImage) -> DetectResult<Detection> {
        self.detect(&Frame::from_image(img)?)
    }

    /// Raw proposals before classification (for debugging)
    pub fn proposals(&self, frame: &Frame) -> Vec<Proposal> {
        let hsv = preprocessing::to_hsv(frame);
        self.proposer.propose(&PreparedFrame { frame, hsv: &hsv })
    }

    /// Cleaned binary mask per colour band (for debugging)
    pub fn band_masks(&self, frame: &Frame) -> Vec<(LightColor, GrayImage)> {
        let hsv = preprocessing::to_hsv(frame);
        contour_proposer(&self.config).masks(&hsv)
    }
}

impl Default for DetectionPipeline {
    fn default() -> Self {
        Self::build(DetectorConfig::default())
    }
}

fn contour_proposer(config: &DetectorConfig) -> ContourProposer {
    ContourProposer {
        bands: config.bands.clone(),
        params: config.contour,
    }
}
