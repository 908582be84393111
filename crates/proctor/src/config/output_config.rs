use crate::config::default_true;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where session output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory; each session writes into its own subdirectory.
    pub export_dir: PathBuf,

    /// Also write verification snapshots next to the recording.
    #[serde(default = "default_true")]
    pub write_snapshots: bool,
}
