mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from trafficlight for tests
pub use trafficlight::{
    ChannelOrder, DetectError, Detection, DetectionPipeline, DetectorConfig, Frame, FrameStatus,
    LightColor, MixedPolicy, Region, Strategy,
};
