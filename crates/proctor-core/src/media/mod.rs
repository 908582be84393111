mod test_pattern;
mod traits;

pub use {
    test_pattern::{TestPatternConfig, TestPatternDevices, TestPatternStream},
    traits::{
        AcquisitionFailure, AudioConstraints, AudioFormat, AudioTrack, FacingMode, FrameFeed,
        MediaConstraints, MediaDevices, MediaStream, VideoConstraints, VideoFrame,
    },
};
