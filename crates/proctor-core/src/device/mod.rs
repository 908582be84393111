mod handle;
mod manager;
mod preview;

pub use {
    handle::HardwareHandle,
    manager::{AcquisitionTimeouts, DeviceManager, Readiness},
    preview::{FrameDimensions, PreviewSink},
};
