pub mod config;
pub mod detection;
pub mod error;
pub mod frame;
pub mod models;

pub use config::{DetectorConfig, MixedPolicy, Strategy};
pub use detection::{Detection, DetectionPipeline};
pub use error::{DetectError, DetectResult};
pub use frame::{ChannelOrder, Frame};
pub use models::{BandCounts, BoundingBox, Contour, FrameStatus, LightColor, Region, RegionResult};
