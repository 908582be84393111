//! Synthetic camera/microphone backend.
//!
//! Produces a sine tone and an animated colour-bar frame feed, driven by the
//! tokio clock so it runs identically under paused (virtual) time.

use crate::{
    CoreResult,
    media::{
        AcquisitionFailure, AudioFormat, AudioTrack, FrameFeed, MediaConstraints, MediaDevices,
        MediaStream, VideoFrame,
    },
};

use std::{
    f32::consts::TAU,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, instrument};

const TONE_AMPLITUDE: f32 = 0.25;

/// Geometry and timing of the synthetic streams.
#[derive(Debug, Clone)]
pub struct TestPatternConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second pushed to the feed.
    pub frame_rate: u32,
    /// Audio sample rate.
    pub sample_rate: u32,
    /// Tone frequency in Hz.
    pub tone_hz: f32,
    /// Delay before the first frame is decoded.
    pub first_frame_delay: Duration,
    /// Whether a camera track exists at all.
    pub video: bool,
}

impl Default for TestPatternConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 360,
            frame_rate: 15,
            sample_rate: 48_000,
            tone_hz: 440.0,
            first_frame_delay: Duration::from_millis(100),
            video: true,
        }
    }
}

/// [`MediaDevices`] implementation backed by generated signals.
///
/// Can be told to refuse access or to never answer, which is how the shell
/// and the tests exercise the acquisition failure paths.
pub struct TestPatternDevices {
    config: TestPatternConfig,
    failure: Mutex<Option<AcquisitionFailure>>,
    never_resolve: AtomicBool,
    granted: Mutex<Vec<Arc<TestPatternStream>>>,
}

impl TestPatternDevices {
    /// Create a backend that grants streams with the given geometry.
    pub fn new(config: TestPatternConfig) -> Self {
        Self {
            config,
            failure: Mutex::new(None),
            never_resolve: AtomicBool::new(false),
            granted: Mutex::new(Vec::new()),
        }
    }

    /// Refuse every subsequent request with `failure`.
    pub fn failing_with(self, failure: AcquisitionFailure) -> Self {
        self.set_failure(Some(failure));
        self
    }

    /// Leave every subsequent request pending forever, like an unanswered prompt.
    pub fn never_resolving(self) -> Self {
        self.never_resolve.store(true, Ordering::Release);
        self
    }

    /// Change the failure mode of later requests. `None` grants again.
    pub fn set_failure(&self, failure: Option<AcquisitionFailure>) {
        *self.failure.lock().unwrap_or_else(|e| e.into_inner()) = failure;
    }

    /// Every stream granted so far, oldest first.
    pub fn granted_streams(&self) -> Vec<Arc<TestPatternStream>> {
        self.granted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl MediaDevices for TestPatternDevices {
    #[instrument(skip(self))]
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Arc<dyn MediaStream>, AcquisitionFailure> {
        if self.never_resolve.load(Ordering::Acquire) {
            std::future::pending::<()>().await;
        }

        let failure = self
            .failure
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(failure) = failure {
            debug!(%failure, "Test pattern acquisition refused");
            return Err(failure);
        }

        let mut granted = self.granted.lock().unwrap_or_else(|e| e.into_inner());
        let stream = Arc::new(TestPatternStream::spawn(
            format!("test-pattern-{}", granted.len()),
            &self.config,
        ));
        granted.push(Arc::clone(&stream));

        info!(
            stream_id = stream.id(),
            ideal_width = constraints.video.ideal_width,
            ideal_height = constraints.video.ideal_height,
            "Test pattern stream granted"
        );

        Ok(stream)
    }
}

/// A synthetic live stream. Stopping it ends the frame feed and silences audio.
pub struct TestPatternStream {
    id: String,
    live: Arc<AtomicBool>,
    audio: Arc<ToneTrack>,
    frames: Option<FrameFeed>,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl TestPatternStream {
    fn spawn(id: String, config: &TestPatternConfig) -> Self {
        let live = Arc::new(AtomicBool::new(true));
        let audio = Arc::new(ToneTrack::new(config, Arc::clone(&live)));

        let (frames, producer) = if config.video {
            let (tx, rx) = watch::channel(None);
            let handle = tokio::spawn(produce_frames(tx, config.clone()));
            (Some(rx), Some(handle))
        } else {
            (None, None)
        };

        Self {
            id,
            live,
            audio,
            frames,
            producer: Mutex::new(producer),
        }
    }

    /// Total samples handed out by the audio track.
    pub fn samples_delivered(&self) -> u64 {
        self.audio.delivered.load(Ordering::Acquire)
    }
}

impl MediaStream for TestPatternStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn audio_track(&self) -> Option<Arc<dyn AudioTrack>> {
        if !self.is_live() {
            return None;
        }
        Some(Arc::clone(&self.audio) as Arc<dyn AudioTrack>)
    }

    fn video_frames(&self) -> Option<FrameFeed> {
        if !self.is_live() {
            return None;
        }
        self.frames.clone()
    }

    fn stop(&self) {
        if self.live.swap(false, Ordering::AcqRel) {
            if let Some(handle) = self
                .producer
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take()
            {
                handle.abort();
            }
            debug!(stream_id = %self.id, "Test pattern tracks stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn produce_frames(tx: watch::Sender<Option<VideoFrame>>, config: TestPatternConfig) {
    tokio::time::sleep(config.first_frame_delay).await;

    let period = Duration::from_secs(1) / config.frame_rate.max(1);
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut index: u32 = 0;
    loop {
        ticker.tick().await;
        let frame = render_frame(config.width, config.height, index);
        tx.send_replace(Some(Arc::new(frame)));
        index = index.wrapping_add(1);
    }
}

fn render_frame(width: u32, height: u32, index: u32) -> RgbImage {
    const BARS: [[u8; 3]; 7] = [
        [192, 192, 192],
        [192, 192, 0],
        [0, 192, 192],
        [0, 192, 0],
        [192, 0, 192],
        [192, 0, 0],
        [0, 0, 192],
    ];

    let bar_width = (width / BARS.len() as u32).max(1);
    RgbImage::from_fn(width, height, |x, _| {
        let bar = (x / bar_width) as usize + (index as usize % BARS.len());
        let bar = bar % BARS.len();
        Rgb(BARS[bar])
    })
}

struct ToneTrack {
    format: AudioFormat,
    tone_hz: f32,
    live: Arc<AtomicBool>,
    started: Instant,
    delivered: AtomicU64,
}

impl ToneTrack {
    fn new(config: &TestPatternConfig, live: Arc<AtomicBool>) -> Self {
        Self {
            format: AudioFormat {
                sample_rate: config.sample_rate,
                channels: 1,
            },
            tone_hz: config.tone_hz,
            live,
            started: Instant::now(),
            delivered: AtomicU64::new(0),
        }
    }
}

impl AudioTrack for ToneTrack {
    fn format(&self) -> AudioFormat {
        self.format
    }

    fn take_samples(&self) -> CoreResult<Vec<i16>> {
        if !self.live.load(Ordering::Acquire) {
            return Ok(Vec::new());
        }

        let rate = u64::from(self.format.sample_rate);
        let due = (self.started.elapsed().as_micros() as u64).saturating_mul(rate) / 1_000_000;
        let from = self.delivered.swap(due, Ordering::AcqRel);
        if due <= from {
            return Ok(Vec::new());
        }

        let samples = (from..due)
            .map(|n| {
                let t = n as f32 / self.format.sample_rate as f32;
                let value = (TAU * self.tone_hz * t).sin() * TONE_AMPLITUDE;
                (value * f32::from(i16::MAX)) as i16
            })
            .collect();

        Ok(samples)
    }
}
