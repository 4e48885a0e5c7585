//! One-write provenance orchestration.
//!
//! Both the interception path and the manual save API funnel through
//! [`record_provenance`], so the sidecar set never depends on how a write
//! was noticed.

use crate::archive;
use crate::caller;
use crate::config::{self, ArchiveOptions};
use crate::metadata::{self, OpenParams};
use crate::sidecar::SidecarPaths;
use crate::snapshot;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Record provenance sidecars for one written output. Returns the metadata
/// sidecar path, which exists only while metadata writing is enabled.
pub(crate) fn record_provenance(output: &Path, open_params: Option<OpenParams>) -> Result<PathBuf> {
    let config = config::current_config();
    let sidecars = SidecarPaths::new(output);
    let script = caller::find_calling_script();
    let descriptor = metadata::build_metadata(script.as_deref(), open_params);

    let metadata_path = sidecars.metadata_path();
    if config.write_metadata {
        metadata::write_metadata(&metadata_path, &descriptor)?;
    }

    if config.write_snapshot {
        if let Some(script) = script.as_deref().filter(|script| script.is_file()) {
            snapshot::write_snapshot(output, script, config.hide_snapshots)?;
        }
    }

    if let Some(options) = config.archive.as_ref() {
        let options = options_with_default_roots(options, script.as_deref());
        if let Some(dest) = archive::build_archive_for_output(output, &options, Some(&descriptor))?
        {
            tracing::debug!(
                archive = %dest.display(),
                output = %output.display(),
                "archived output"
            );
        }
    }

    Ok(metadata_path)
}

/// An empty `local_roots` means "the calling script's directory".
fn options_with_default_roots(options: &ArchiveOptions, script: Option<&Path>) -> ArchiveOptions {
    if !options.local_roots.is_empty() {
        return options.clone();
    }
    let mut resolved = options.clone();
    if let Some(dir) = script.and_then(Path::parent) {
        resolved.local_roots = vec![dir.to_path_buf()];
    }
    resolved
}

/// Write `data` to `output_path` and record which script produced it,
/// returning the metadata sidecar path.
///
/// The data write itself is a hard error; provenance recording stays best
/// effort and never fails the save.
pub fn save_output(data: impl AsRef<[u8]>, output_path: impl AsRef<Path>) -> Result<PathBuf> {
    let output = output_path.as_ref();
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(output, data.as_ref()).with_context(|| format!("write {}", output.display()))?;

    let metadata_path = SidecarPaths::new(output).metadata_path();
    if let Err(err) = record_provenance(output, None) {
        tracing::debug!(
            error = %err,
            output = %output.display(),
            "provenance recording failed"
        );
    }
    Ok(metadata_path)
}
