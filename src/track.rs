//! Write interception with a process-global toggle.
//!
//! There is no patching a process's file APIs in Rust, so interception is a
//! seam the crate owns: open files through [`OpenOptions`] (or the [`create`]
//! and [`append`] shorthands) and every successful write-mode open is
//! recorded while the toggle is on. Disabled, the wrappers are plain
//! passthroughs.

use crate::metadata::OpenParams;
use crate::record;
use std::cell::Cell;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static TRACKING: AtomicBool = AtomicBool::new(false);

thread_local! {
    // Suppresses recording while the recorder itself is writing sidecars.
    static RECORDING: Cell<bool> = const { Cell::new(false) };
}

/// Start recording provenance for write-mode opens. Idempotent.
pub fn enable_tracking() {
    TRACKING.store(true, Ordering::SeqCst);
}

/// Stop recording provenance. Idempotent.
pub fn disable_tracking() {
    TRACKING.store(false, Ordering::SeqCst);
}

/// Whether the global toggle is currently on.
pub fn tracking_enabled() -> bool {
    TRACKING.load(Ordering::SeqCst)
}

/// Mirror of `std::fs::OpenOptions` that records provenance on successful
/// write-mode opens while tracking is enabled.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    inner: std::fs::OpenOptions,
    params: OpenParams,
}

impl OpenOptions {
    /// Create a blank set of options, all flags off.
    pub fn new() -> Self {
        Self {
            inner: std::fs::OpenOptions::new(),
            params: OpenParams::default(),
        }
    }

    /// Open for reading.
    pub fn read(&mut self, read: bool) -> &mut Self {
        self.inner.read(read);
        self.params.read = read;
        self
    }

    /// Open for writing.
    pub fn write(&mut self, write: bool) -> &mut Self {
        self.inner.write(write);
        self.params.write = write;
        self
    }

    /// Open in append mode.
    pub fn append(&mut self, append: bool) -> &mut Self {
        self.inner.append(append);
        self.params.append = append;
        self
    }

    /// Create the file if it does not exist.
    pub fn create(&mut self, create: bool) -> &mut Self {
        self.inner.create(create);
        self.params.create = create;
        self
    }

    /// Require that the open creates the file.
    pub fn create_new(&mut self, create_new: bool) -> &mut Self {
        self.inner.create_new(create_new);
        self.params.create_new = create_new;
        self
    }

    /// Truncate the file on open.
    pub fn truncate(&mut self, truncate: bool) -> &mut Self {
        self.inner.truncate(truncate);
        self.params.truncate = truncate;
        self
    }

    /// Open the file, then record provenance when the mode writes. The open
    /// result is returned unchanged whether or not recording succeeds.
    pub fn open(&self, path: impl AsRef<Path>) -> io::Result<File> {
        let path = path.as_ref();
        let file = self.inner.open(path)?;
        maybe_record(path, &self.params);
        Ok(file)
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// `std::fs::File::create` equivalent that records provenance.
pub fn create(path: impl AsRef<Path>) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

/// Open for appending, creating the file if needed, recording provenance.
pub fn append(path: impl AsRef<Path>) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

fn maybe_record(path: &Path, params: &OpenParams) {
    if !params.writes() || !tracking_enabled() {
        return;
    }
    if RECORDING.with(Cell::get) {
        return;
    }
    RECORDING.with(|flag| flag.set(true));
    let result = record::record_provenance(path, Some(params.clone()));
    RECORDING.with(|flag| flag.set(false));
    if let Err(err) = result {
        tracing::debug!(
            error = %err,
            path = %path.display(),
            "provenance recording failed"
        );
    }
}
