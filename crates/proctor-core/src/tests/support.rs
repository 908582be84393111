use crate::{
    DelayStrategy, FixedDelay, MediaDevices, ProctorController, SessionEvent, SessionSettings,
    TestPatternConfig, TestPatternDevices,
};

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

pub(crate) const SAMPLE_RATE: u32 = 8_000;

/// Small frames at a low rate keep virtual-time runs cheap.
pub(crate) fn small_pattern() -> TestPatternConfig {
    TestPatternConfig {
        width: 32,
        height: 24,
        frame_rate: 5,
        sample_rate: SAMPLE_RATE,
        tone_hz: 440.0,
        first_frame_delay: Duration::from_millis(100),
        video: true,
    }
}

pub(crate) fn fast_settings() -> SessionSettings {
    let mut settings = SessionSettings::default();
    settings.timeouts.grant = Duration::from_secs(2);
    settings.timeouts.preview = Duration::from_secs(1);
    settings
}

/// Snapshot timers at 5 s and 60 s.
pub(crate) fn fixed_delays() -> Arc<dyn DelayStrategy> {
    Arc::new(FixedDelay::new(
        Duration::from_secs(5),
        Duration::from_secs(60),
    ))
}

pub(crate) struct Harness {
    pub(crate) controller: ProctorController,
    pub(crate) devices: Arc<TestPatternDevices>,
    pub(crate) events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Harness {
    pub(crate) fn new(devices: TestPatternDevices, delays: Arc<dyn DelayStrategy>) -> Self {
        Self::with_settings(devices, delays, fast_settings())
    }

    pub(crate) fn with_settings(
        devices: TestPatternDevices,
        delays: Arc<dyn DelayStrategy>,
        settings: SessionSettings,
    ) -> Self {
        let devices = Arc::new(devices);
        let (events_tx, events) = mpsc::unbounded_channel::<SessionEvent>();
        let controller = ProctorController::new(
            Arc::clone(&devices) as Arc<dyn MediaDevices>,
            Arc::new(events_tx),
            settings,
        )
        .with_delay_strategy(delays);

        Self {
            controller,
            devices,
            events,
        }
    }

    /// Everything emitted so far, excluding elapsed ticks.
    pub(crate) fn drain(&mut self) -> Vec<SessionEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if !matches!(event, SessionEvent::Elapsed(_)) {
                drained.push(event);
            }
        }
        drained
    }

    /// Everything emitted so far, elapsed ticks included.
    pub(crate) fn drain_all(&mut self) -> Vec<SessionEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }
}

pub(crate) fn snapshot_count(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::SnapshotCaptured(_)))
        .count()
}

pub(crate) fn artifact_count(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, SessionEvent::ArtifactReady(_)))
        .count()
}
