use std::{sync::Mutex, time::Duration};

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Half-open window `[min, max)` a snapshot delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayWindow {
    /// Earliest delay after session start.
    pub min: Duration,
    /// Exclusive upper bound.
    pub max: Duration,
}

impl DelayWindow {
    /// First snapshot: 3–8 s after start.
    pub const FIRST_SNAPSHOT: DelayWindow = DelayWindow {
        min: Duration::from_secs(3),
        max: Duration::from_secs(8),
    };

    /// Second snapshot: 30–90 s after start.
    pub const SECOND_SNAPSHOT: DelayWindow = DelayWindow {
        min: Duration::from_secs(30),
        max: Duration::from_secs(90),
    };

    /// Build a window from whole seconds.
    pub const fn from_secs(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// Whether `delay` falls inside the window.
    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min && delay < self.max
    }

    /// Whether the two windows share no instant.
    pub fn is_disjoint_from(&self, other: &DelayWindow) -> bool {
        self.max <= other.min || other.max <= self.min
    }
}

/// Draw a delay uniformly from `window` with millisecond resolution.
///
/// An empty or inverted window yields `window.min`.
pub fn draw_delay<R: Rng + ?Sized>(rng: &mut R, window: DelayWindow) -> Duration {
    let min = window.min.as_millis() as u64;
    let max = window.max.as_millis() as u64;
    if max <= min {
        return window.min;
    }
    Duration::from_millis(rng.random_range(min..max))
}

/// Which of the two snapshot timers a delay is drawn for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSlot {
    /// Early timer.
    First,
    /// Late timer.
    Second,
}

/// Source of snapshot delays. Swap it out to force exact fire times.
pub trait DelayStrategy: Send + Sync {
    /// Delay for the `slot` timer, nominally inside `window`.
    fn draw_delay(&self, slot: SnapshotSlot, window: DelayWindow) -> Duration;
}

/// Uniform draws from an owned RNG.
pub struct UniformDelay {
    rng: Mutex<StdRng>,
}

impl UniformDelay {
    /// Seed from the operating system.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible draws.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for UniformDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayStrategy for UniformDelay {
    fn draw_delay(&self, _slot: SnapshotSlot, window: DelayWindow) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        draw_delay(&mut *rng, window)
    }
}

/// The same delay for a slot every session, ignoring the window.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    first: Duration,
    second: Duration,
}

impl FixedDelay {
    /// Fire the first timer after `first` and the second after `second`.
    pub fn new(first: Duration, second: Duration) -> Self {
        Self { first, second }
    }
}

impl DelayStrategy for FixedDelay {
    fn draw_delay(&self, slot: SnapshotSlot, _window: DelayWindow) -> Duration {
        match slot {
            SnapshotSlot::First => self.first,
            SnapshotSlot::Second => self.second,
        }
    }
}
