//! Process-global tracker configuration.
//!
//! Tracking is toggled per process, so its knobs live in one shared snapshot
//! that [`configure`] replaces wholesale. Readers clone the snapshot to keep
//! the lock window short.

use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::sync::RwLock;

/// Default cap on the number of local source files bundled into an archive.
pub const DEFAULT_MAX_ARCHIVE_FILES: usize = 500;
/// Default cap on the total bytes of local sources bundled into an archive.
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 50_000_000;

/// What gets recorded for each tracked write.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Write the `<output>.metadata.json` sidecar.
    pub write_metadata: bool,
    /// Copy the calling script next to the output.
    pub write_snapshot: bool,
    /// Mark snapshot copies hidden where the host OS supports it.
    pub hide_snapshots: bool,
    /// Bundle metadata, snapshot, and local sources into a zip per write.
    /// Archiving is opt-in; `None` skips it.
    pub archive: Option<ArchiveOptions>,
}

/// Knobs for archive bundles.
#[derive(Debug, Clone)]
pub struct ArchiveOptions {
    /// Directory the dated run tree is created under.
    pub archive_root: PathBuf,
    /// Directories whose source files count as local dependencies. Empty
    /// means "the calling script's directory".
    pub local_roots: Vec<PathBuf>,
    /// Cap on bundled dependency files.
    pub max_files: usize,
    /// Cap on bundled dependency bytes.
    pub max_bytes: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            write_metadata: true,
            write_snapshot: true,
            hide_snapshots: false,
            archive: None,
        }
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            archive_root: default_archive_root(),
            local_roots: Vec::new(),
            max_files: DEFAULT_MAX_ARCHIVE_FILES,
            max_bytes: DEFAULT_MAX_ARCHIVE_BYTES,
        }
    }
}

/// Platform data directory for archives, with a relative fallback when the
/// platform reports none.
pub fn default_archive_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("whichscript").join("archive"))
        .unwrap_or_else(|| PathBuf::from("whichscript-archive"))
}

static CONFIG: Lazy<RwLock<TrackerConfig>> = Lazy::new(|| RwLock::new(TrackerConfig::default()));

/// Replace the process-global tracker configuration.
pub fn configure(config: TrackerConfig) {
    match CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// Snapshot the current tracker configuration.
pub fn current_config() -> TrackerConfig {
    match CONFIG.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}
