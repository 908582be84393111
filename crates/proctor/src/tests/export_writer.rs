use crate::{AppError, ExportWriter};

use proctor_core::{AudioArtifact, BlobRegistry, SnapshotRecord, format_elapsed};

use std::{fs, sync::Arc, time::Duration};

use chrono::Utc;
use uuid::Uuid;

fn artifact(session_id: Uuid, elapsed_seconds: u64) -> AudioArtifact {
    let registry = BlobRegistry::new();
    AudioArtifact {
        session_id,
        url: registry.create_object_url(vec![0; 8], "audio/wav"),
        mime_type: "audio/wav".to_string(),
        size_bytes: 8,
        elapsed_seconds,
        elapsed_label: format_elapsed(elapsed_seconds),
    }
}

fn snapshot(session_id: Uuid, sequence: u8) -> SnapshotRecord {
    SnapshotRecord {
        session_id,
        sequence,
        captured_at: Utc::now(),
        session_offset: Duration::from_secs(5),
        image_blob: Arc::from(vec![0xFF, 0xD8, sequence, 0xFF, 0xD9]),
    }
}

/// WHAT: ExportWriter creates its root directory
/// WHY: The configured export directory may not exist on first run
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_root_when_creating_writer_then_directory_created() {
    // Given: A path below a fresh temp dir
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("nested").join("recordings");

    // When: Creating the writer
    let result = ExportWriter::new(root.clone());

    // Then: The directory exists
    assert!(result.is_ok());
    assert!(root.is_dir());
}

/// WHAT: Recordings are written under the session directory with the MM-SS name
/// WHY: Users find the answer by session and length
#[test]
#[allow(clippy::unwrap_used)]
fn given_artifact_when_writing_then_named_file_in_session_dir() {
    // Given: A writer and a 95 s artifact
    let temp = tempfile::tempdir().unwrap();
    let writer = ExportWriter::new(temp.path().to_path_buf()).unwrap();
    let session_id = Uuid::new_v4();
    let bytes = b"RIFF....WAVE".to_vec();

    // When: Writing the artifact
    let path = writer
        .write_artifact(&artifact(session_id, 95), &bytes)
        .unwrap();

    // Then: The file sits in the session directory with the expected contents
    assert_eq!(path, writer.session_dir(session_id).join("recording-01-35.wav"));
    assert_eq!(fs::read(&path).unwrap(), bytes);
    assert!(!path.with_file_name("recording-01-35.wav.tmp").exists());
}

/// WHAT: Both snapshots land next to the recording
/// WHY: Reviewers compare the frames with the answer
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_snapshots_when_writing_then_sequence_named_files() {
    let temp = tempfile::tempdir().unwrap();
    let writer = ExportWriter::new(temp.path().to_path_buf()).unwrap();
    let session_id = Uuid::new_v4();

    let first = writer.write_snapshot(&snapshot(session_id, 1)).unwrap();
    let second = writer.write_snapshot(&snapshot(session_id, 2)).unwrap();

    let dir = writer.session_dir(session_id);
    assert_eq!(first, dir.join("snapshot-1.jpg"));
    assert_eq!(second, dir.join("snapshot-2.jpg"));
    assert_eq!(fs::read(&second).unwrap(), vec![0xFF, 0xD8, 2, 0xFF, 0xD9]);
}

/// WHAT: Rewriting the same artifact replaces the file
/// WHY: The atomic rename must succeed over an existing export
#[test]
#[allow(clippy::unwrap_used)]
fn given_existing_export_when_writing_again_then_replaced() {
    let temp = tempfile::tempdir().unwrap();
    let writer = ExportWriter::new(temp.path().to_path_buf()).unwrap();
    let session_id = Uuid::new_v4();
    let artifact = artifact(session_id, 2);

    writer.write_artifact(&artifact, b"old").unwrap();
    let path = writer.write_artifact(&artifact, b"new").unwrap();

    assert_eq!(fs::read(&path).unwrap(), b"new");
}

/// WHAT: An unwritable root reports ExportFailed
/// WHY: Export problems must be visible, not silently dropped
#[test]
#[allow(clippy::unwrap_used)]
fn given_root_is_a_file_when_creating_writer_then_export_failed() {
    // Given: A regular file where the directory should be
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("occupied");
    fs::write(&root, b"not a directory").unwrap();

    // When: Creating the writer
    let result = ExportWriter::new(root);

    // Then: ExportFailed
    assert!(matches!(result, Err(AppError::ExportFailed { .. })));
}
