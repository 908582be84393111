//! Audio container selection and chunk encoding.

use crate::{CoreResult, ProctorError, media::AudioFormat};

use std::{io::Cursor, panic::Location};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, info};

/// Container preference order, most compact first.
pub const DEFAULT_MIME_PREFERENCES: &[&str] = &[
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/ogg;codecs=opus",
    "audio/mp4",
    "audio/wav",
];

/// Produces encoders for the audio containers a platform supports.
pub trait AudioEncoderFactory: Send + Sync {
    /// Whether `mime_type` can be produced.
    fn is_type_supported(&self, mime_type: &str) -> bool;

    /// Container used when no preference is supported.
    fn default_mime_type(&self) -> &str;

    /// Build an encoder. `None` asks for the platform default.
    fn create(
        &self,
        mime_type: Option<&str>,
        format: AudioFormat,
    ) -> CoreResult<Box<dyn ChunkEncoder>>;
}

/// Streaming encoder owned by one recording.
pub trait ChunkEncoder: Send {
    /// Container this encoder writes.
    fn mime_type(&self) -> &str;

    /// Encode one flush worth of samples into a chunk.
    fn encode_chunk(&mut self, samples: &[i16]) -> CoreResult<Vec<u8>>;

    /// Assemble every chunk into one playable object.
    fn finalize(&mut self, chunks: &[Vec<u8>]) -> CoreResult<Vec<u8>>;
}

/// Pick the first preference the factory supports.
///
/// `None` means none is supported; recording still proceeds with the default.
pub fn select_mime_type<'a>(
    factory: &dyn AudioEncoderFactory,
    preferences: &'a [String],
) -> Option<&'a str> {
    let selected = preferences
        .iter()
        .map(String::as_str)
        .find(|mime_type| factory.is_type_supported(mime_type));

    match selected {
        Some(mime_type) => debug!(mime_type, "Audio container selected"),
        None => info!(
            default = factory.default_mime_type(),
            "No preferred audio container supported, using platform default"
        ),
    }

    selected
}

/// File extension conventionally used for a container.
pub fn extension_for(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "audio/webm" => "webm",
        "audio/ogg" => "ogg",
        "audio/mp4" => "m4a",
        "audio/wav" | "audio/wave" | "audio/x-wav" => "wav",
        _ => "bin",
    }
}

/// 16-bit PCM WAV, the container every platform can play back.
#[derive(Debug, Default, Clone, Copy)]
pub struct WavEncoderFactory;

impl AudioEncoderFactory for WavEncoderFactory {
    fn is_type_supported(&self, mime_type: &str) -> bool {
        extension_for(mime_type) == "wav"
    }

    fn default_mime_type(&self) -> &str {
        "audio/wav"
    }

    fn create(
        &self,
        _mime_type: Option<&str>,
        format: AudioFormat,
    ) -> CoreResult<Box<dyn ChunkEncoder>> {
        Ok(Box::new(WavChunkEncoder { format }))
    }
}

struct WavChunkEncoder {
    format: AudioFormat,
}

impl ChunkEncoder for WavChunkEncoder {
    fn mime_type(&self) -> &str {
        "audio/wav"
    }

    fn encode_chunk(&mut self, samples: &[i16]) -> CoreResult<Vec<u8>> {
        Ok(samples.iter().flat_map(|s| s.to_le_bytes()).collect())
    }

    fn finalize(&mut self, chunks: &[Vec<u8>]) -> CoreResult<Vec<u8>> {
        let spec = WavSpec {
            channels: self.format.channels,
            sample_rate: self.format.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = WavWriter::new(&mut cursor, spec).map_err(|e| wav_error(e, "header"))?;

        for chunk in chunks {
            for pair in chunk.chunks_exact(2) {
                let sample = i16::from_le_bytes([pair[0], pair[1]]);
                writer
                    .write_sample(sample)
                    .map_err(|e| wav_error(e, "sample"))?;
            }
        }

        writer.finalize().map_err(|e| wav_error(e, "finalize"))?;

        Ok(cursor.into_inner())
    }
}

#[track_caller]
fn wav_error(error: hound::Error, stage: &str) -> ProctorError {
    ProctorError::EncoderError {
        reason: format!("WAV {} failed: {}", stage, error),
        location: ErrorLocation::from(Location::caller()),
    }
}
