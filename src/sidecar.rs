//! Sidecar path derivation.
//!
//! Every sidecar name hangs off the output's full file name so artifacts sort
//! next to the file they describe. Centralizing the scheme keeps writers and
//! readers agreed on where things live.

use std::fs;
use std::path::{Path, PathBuf};

/// Suffix of the JSON metadata sidecar.
pub const METADATA_SUFFIX: &str = ".metadata.json";
/// Suffix of the script snapshot sidecar.
pub const SNAPSHOT_SUFFIX: &str = ".script";

/// Locates the sidecar files that describe one output artifact.
#[derive(Debug, Clone)]
pub struct SidecarPaths {
    output: PathBuf,
}

impl SidecarPaths {
    /// Create a path helper for one output file.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    /// Return the output path the sidecars describe.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// File name of the output, used for archive directory naming.
    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string())
    }

    /// Return the `<output>.metadata.json` path.
    pub fn metadata_path(&self) -> PathBuf {
        append_suffix(&self.output, METADATA_SUFFIX)
    }

    /// Return the raw `<output>.script` snapshot path.
    pub fn snapshot_path(&self) -> PathBuf {
        append_suffix(&self.output, SNAPSHOT_SUFFIX)
    }

    /// Snapshot path carrying the source file's extension when it has one,
    /// e.g. `out.csv.script.rs` for a Rust caller.
    pub fn snapshot_path_for(&self, source: &Path) -> PathBuf {
        match source.extension() {
            Some(ext) => append_suffix(
                &self.output,
                &format!("{SNAPSHOT_SUFFIX}.{}", ext.to_string_lossy()),
            ),
            None => self.snapshot_path(),
        }
    }

    /// Find a snapshot on disk, preferring extension-carrying forms over the
    /// raw `.script` copy.
    pub fn existing_snapshot(&self) -> Option<PathBuf> {
        let prefix = format!("{}{SNAPSHOT_SUFFIX}.", self.output_name());
        let parent = match self.output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if let Ok(entries) = fs::read_dir(&parent) {
            let mut candidates: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().starts_with(&prefix))
                        .unwrap_or(false)
                })
                .collect();
            candidates.sort();
            if let Some(found) = candidates.into_iter().next() {
                return Some(found);
            }
        }
        let raw = self.snapshot_path();
        raw.is_file().then_some(raw)
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.push_str(suffix);
    path.with_file_name(name)
}
