mod artifact;
mod blob;
mod encoder;
mod session;

pub(crate) use session::{FinishedRecording, RecordingSession, SessionShared, StartRequest};

pub use {
    artifact::{AudioArtifact, format_elapsed},
    blob::{BlobRegistry, ObjectUrl},
    encoder::{
        AudioEncoderFactory, ChunkEncoder, DEFAULT_MIME_PREFERENCES, WavEncoderFactory,
        extension_for, select_mime_type,
    },
    session::SessionState,
};
