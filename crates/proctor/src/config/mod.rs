mod device_config;
#[allow(clippy::module_inception)]
mod config;
mod output_config;
mod session_config;

pub(crate) use {
    config::Config, device_config::DeviceConfig, output_config::OutputConfig,
    session_config::SessionConfig,
};

use proctor_core::{DEFAULT_JPEG_QUALITY, DEFAULT_TIMESLICE, SessionSettings};

pub(crate) const DEFAULT_MAX_DURATION_SECS: u64 = 600;

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

pub(crate) fn default_timeslice_ms() -> u64 {
    DEFAULT_TIMESLICE.as_millis() as u64
}

pub(crate) fn default_max_duration_secs() -> u64 {
    DEFAULT_MAX_DURATION_SECS
}

pub(crate) fn default_grant_timeout_secs() -> u64 {
    SessionSettings::default().timeouts.grant.as_secs()
}

pub(crate) fn default_preview_timeout_secs() -> u64 {
    SessionSettings::default().timeouts.preview.as_secs()
}
