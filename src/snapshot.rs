//! Script snapshot sidecars.
//!
//! A snapshot preserves the exact source text at write time, so later edits
//! to the script cannot silently change what an output claims produced it.

use crate::sidecar::SidecarPaths;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Copy `script` next to `output`, returning the snapshot path.
pub fn write_snapshot(output: &Path, script: &Path, hide: bool) -> Result<PathBuf> {
    let dest = SidecarPaths::new(output).snapshot_path_for(script);
    if let Some(parent) = dest.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::copy(script, &dest)
        .with_context(|| format!("copy {} to {}", script.display(), dest.display()))?;
    if hide {
        hide_file(&dest);
    }
    Ok(dest)
}

// Best-effort hidden attribute. Only Windows has one; the sidecar name is
// fixed, so a dot-prefix rename is not an option elsewhere.
#[cfg(windows)]
fn hide_file(path: &Path) {
    use std::process::Command;
    let _ = Command::new("attrib").arg("+h").arg(path).status();
}

#[cfg(not(windows))]
fn hide_file(_path: &Path) {}
