use crate::{
    AudioArtifact, AudioEncoderFactory, AudioFormat, BlobRegistry, DEFAULT_MIME_PREFERENCES,
    WavEncoderFactory, extension_for, format_elapsed, select_mime_type,
};

use std::io::Cursor;

use uuid::Uuid;

/// WHAT: Elapsed seconds render as zero-padded MM:SS
/// WHY: The label is shown to the user and embedded in export names
#[test]
fn given_elapsed_seconds_when_formatting_then_mm_ss() {
    assert_eq!(format_elapsed(0), "00:00");
    assert_eq!(format_elapsed(2), "00:02");
    assert_eq!(format_elapsed(95), "01:35");
    assert_eq!(format_elapsed(3_600), "60:00");
}

/// WHAT: Known containers map to conventional extensions
/// WHY: Export file names must open in standard players
#[test]
fn given_mime_types_when_mapping_extension_then_conventional_names() {
    assert_eq!(extension_for("audio/webm;codecs=opus"), "webm");
    assert_eq!(extension_for("audio/ogg; codecs=opus"), "ogg");
    assert_eq!(extension_for("audio/mp4"), "m4a");
    assert_eq!(extension_for("audio/wav"), "wav");
    assert_eq!(extension_for("audio/flac"), "bin");
}

/// WHAT: The first supported preference wins
/// WHY: Compact containers are preferred when the platform has them
#[test]
fn given_default_preferences_when_selecting_then_first_supported_chosen() {
    let preferences: Vec<String> = DEFAULT_MIME_PREFERENCES
        .iter()
        .map(|mime_type| mime_type.to_string())
        .collect();

    assert_eq!(
        select_mime_type(&WavEncoderFactory, &preferences),
        Some("audio/wav")
    );
}

/// WHAT: No supported preference falls back to the platform default
/// WHY: An unsupported MIME list must not prevent recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_unsupported_preferences_when_selecting_then_default_encoder_used() {
    // Given: Only containers the WAV factory cannot produce
    let preferences = vec!["audio/webm;codecs=opus".to_string(), "audio/mp4".to_string()];
    let factory = WavEncoderFactory;

    // When: Selecting and building the encoder
    let selected = select_mime_type(&factory, &preferences);
    let encoder = factory
        .create(
            selected,
            AudioFormat {
                sample_rate: 8_000,
                channels: 1,
            },
        )
        .unwrap();

    // Then: Nothing was selected and the default container is used
    assert_eq!(selected, None);
    assert_eq!(encoder.mime_type(), factory.default_mime_type());
}

/// WHAT: Chunks finalize into one playable WAV
/// WHY: Periodic flushes must reassemble without losing samples
#[test]
#[allow(clippy::unwrap_used)]
fn given_several_chunks_when_finalizing_then_wav_holds_every_sample() {
    // Given: Three chunks of known samples
    let format = AudioFormat {
        sample_rate: 8_000,
        channels: 1,
    };
    let mut encoder = WavEncoderFactory.create(None, format).unwrap();
    let batches: [Vec<i16>; 3] = [vec![1, 2, 3], vec![-4, 5], vec![i16::MAX, i16::MIN]];
    let chunks: Vec<Vec<u8>> = batches
        .iter()
        .map(|batch| encoder.encode_chunk(batch).unwrap())
        .collect();

    // When: Finalizing
    let bytes = encoder.finalize(&chunks).unwrap();

    // Then: The WAV reads back as the concatenated samples
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.spec().sample_rate, 8_000);
    assert_eq!(reader.spec().channels, 1);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, 2, 3, -4, 5, i16::MAX, i16::MIN]);
}

/// WHAT: Finalizing without chunks still yields a valid header
/// WHY: A session stopped instantly produces an empty but playable artifact
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_chunks_when_finalizing_then_empty_wav() {
    let format = AudioFormat {
        sample_rate: 8_000,
        channels: 1,
    };
    let mut encoder = WavEncoderFactory.create(None, format).unwrap();

    let bytes = encoder.finalize(&[]).unwrap();

    let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
    assert_eq!(reader.duration(), 0);
}

/// WHAT: Object URLs resolve until revoked
/// WHY: Artifact bytes must not outlive their URL
#[test]
fn given_object_url_when_revoked_then_no_longer_resolves() {
    // Given: A registry with one blob
    let registry = BlobRegistry::new();
    let url = registry.create_object_url(vec![1, 2, 3], "audio/wav");
    assert!(url.as_str().starts_with("blob:"));
    assert_eq!(registry.resolve(&url).as_deref(), Some(&[1u8, 2, 3][..]));
    assert_eq!(registry.mime_type(&url).as_deref(), Some("audio/wav"));

    // When: Revoking twice
    let first = registry.revoke(&url);
    let second = registry.revoke(&url);

    // Then: Only the first revoke did anything
    assert!(first);
    assert!(!second);
    assert!(registry.resolve(&url).is_none());
    assert_eq!(registry.live_count(), 0);
}

/// WHAT: revoke_all invalidates every URL
/// WHY: Teardown must leave no live blob behind
#[test]
fn given_several_urls_when_revoking_all_then_registry_empty() {
    let registry = BlobRegistry::new();
    let a = registry.create_object_url(vec![1], "audio/wav");
    let b = registry.create_object_url(vec![2], "audio/wav");
    assert_ne!(a, b);

    assert_eq!(registry.revoke_all(), 2);
    assert_eq!(registry.revoke_all(), 0);
    assert!(registry.resolve(&a).is_none());
    assert!(registry.resolve(&b).is_none());
}

/// WHAT: Artifact export names embed the elapsed label and extension
/// WHY: Users download files such as recording-01-35.wav
#[test]
fn given_artifact_when_naming_then_label_and_extension_used() {
    let registry = BlobRegistry::new();
    let artifact = AudioArtifact {
        session_id: Uuid::new_v4(),
        url: registry.create_object_url(vec![0; 4], "audio/wav"),
        mime_type: "audio/wav".to_string(),
        size_bytes: 4,
        elapsed_seconds: 95,
        elapsed_label: format_elapsed(95),
    };

    assert_eq!(artifact.file_name(), "recording-01-35.wav");
    assert_eq!(artifact.duration().as_secs(), 95);
}
