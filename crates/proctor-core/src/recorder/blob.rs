//! Memory-backed object URLs.
//!
//! An artifact is handed to the shell as a URL rather than as bytes. The bytes
//! stay alive until the URL is revoked, so every URL must be revoked when it is
//! superseded or when the controller is torn down.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex},
};

use tracing::debug;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:proctor/";

/// Reference to bytes held by a [`BlobRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// The URL text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct Blob {
    mime_type: String,
    bytes: Arc<[u8]>,
}

/// Registry of live object URLs.
#[derive(Default)]
pub struct BlobRegistry {
    blobs: Mutex<HashMap<ObjectUrl, Blob>>,
}

impl BlobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes and return the URL that keeps them alive.
    pub fn create_object_url(&self, bytes: Vec<u8>, mime_type: &str) -> ObjectUrl {
        let url = ObjectUrl(format!("{}{}", URL_PREFIX, Uuid::new_v4()));
        let size = bytes.len();

        self.blobs.lock().unwrap_or_else(|e| e.into_inner()).insert(
            url.clone(),
            Blob {
                mime_type: mime_type.to_string(),
                bytes: bytes.into(),
            },
        );

        debug!(url = %url, size, mime_type, "Object URL created");
        url
    }

    /// Bytes behind a live URL.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<Arc<[u8]>> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .map(|blob| Arc::clone(&blob.bytes))
    }

    /// MIME type recorded for a live URL.
    pub fn mime_type(&self, url: &ObjectUrl) -> Option<String> {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .map(|blob| blob.mime_type.clone())
    }

    /// Invalidate one URL. Returns whether it was live.
    pub fn revoke(&self, url: &ObjectUrl) -> bool {
        let revoked = self
            .blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(url)
            .is_some();

        if revoked {
            debug!(url = %url, "Object URL revoked");
        }
        revoked
    }

    /// Invalidate every URL. Returns how many were live.
    pub fn revoke_all(&self) -> usize {
        let mut blobs = self.blobs.lock().unwrap_or_else(|e| e.into_inner());
        let count = blobs.len();
        blobs.clear();

        if count > 0 {
            debug!(count, "All object URLs revoked");
        }
        count
    }

    /// Number of URLs still live.
    pub fn live_count(&self) -> usize {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
