mod delay;
mod record;
pub(crate) mod scheduler;

pub use {
    delay::{DelayStrategy, DelayWindow, FixedDelay, SnapshotSlot, UniformDelay, draw_delay},
    record::{MAX_SNAPSHOTS, SnapshotRecord},
    scheduler::encode_jpeg,
};
