//! Archive bundles for tracked outputs.
//!
//! Each bundle is a zip holding the metadata descriptor, the script snapshot,
//! and a bounded set of local source files, laid out under a dated run
//! directory so repeated runs never overwrite each other.

use crate::caller;
use crate::config::ArchiveOptions;
use crate::metadata::OutputMetadata;
use crate::sidecar::SidecarPaths;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build the archive bundle for an existing output file.
///
/// Returns `Ok(None)` when the output does not exist; archiving something
/// that was never written would only record a lie. Per-dependency failures
/// are skipped, and the caps stop the bundle rather than fail it.
pub fn build_archive_for_output(
    output: &Path,
    options: &ArchiveOptions,
    metadata: Option<&OutputMetadata>,
) -> Result<Option<PathBuf>> {
    if !output.exists() {
        return Ok(None);
    }
    let sidecars = SidecarPaths::new(output);
    let output_name = sidecars.output_name();
    let dest = archive_dest(&options.archive_root, &output_name, Local::now())?;

    let file =
        fs::File::create(&dest).with_context(|| format!("create archive {}", dest.display()))?;
    let mut zip = ZipWriter::new(file);
    let zip_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    if let Some(metadata) = metadata {
        let json = serde_json::to_string_pretty(metadata).context("serialize archive metadata")?;
        zip.start_file("metadata.json", zip_options)
            .context("add metadata.json")?;
        zip.write_all(json.as_bytes()).context("write metadata.json")?;
    }

    if let Some(snapshot) = sidecars.existing_snapshot() {
        let arcname = snapshot_arcname(&snapshot, &output_name);
        let mut source = fs::File::open(&snapshot)
            .with_context(|| format!("open snapshot {}", snapshot.display()))?;
        zip.start_file(arcname, zip_options).context("add snapshot")?;
        io::copy(&mut source, &mut zip).context("write snapshot")?;
    }

    let mut total: u64 = 0;
    let mut count: usize = 0;
    for (root, path) in select_local_sources(&options.local_roots) {
        let Ok(file_meta) = fs::metadata(&path) else {
            continue;
        };
        let size = file_meta.len();
        if count >= options.max_files || total + size > options.max_bytes {
            tracing::debug!(
                max_files = options.max_files,
                max_bytes = options.max_bytes,
                "archive dependency caps reached"
            );
            break;
        }
        let rel = path.strip_prefix(&root).unwrap_or(&path);
        let arcname = format!("deps/{}", rel.to_string_lossy().replace('\\', "/"));
        if zip.start_file(arcname, zip_options).is_err() {
            continue;
        }
        let Ok(mut source) = fs::File::open(&path) else {
            continue;
        };
        if io::copy(&mut source, &mut zip).is_err() {
            continue;
        }
        total += size;
        count += 1;
    }

    zip.finish().context("finalize archive")?;
    Ok(Some(dest))
}

/// `<root>/<output_name>/<date>/run-<timestamp>/<output_name>.ws.zip`, with
/// the run directory created on the way.
fn archive_dest(archive_root: &Path, output_name: &str, now: DateTime<Local>) -> Result<PathBuf> {
    let run_dir = archive_root
        .join(output_name)
        .join(now.format("%Y-%m-%d").to_string())
        .join(format!("run-{}", now.format("%Y%m%d-%H%M%S")));
    fs::create_dir_all(&run_dir).with_context(|| format!("create {}", run_dir.display()))?;
    Ok(run_dir.join(format!("{output_name}.ws.zip")))
}

fn snapshot_arcname(snapshot: &Path, output_name: &str) -> String {
    let name = snapshot
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    name.strip_prefix(&format!("{output_name}."))
        .map(str::to_string)
        .unwrap_or_else(|| "script".to_string())
}

/// Collect local source files under the given roots, deduplicated, skipping
/// build output, sidecar snapshots, and anything classified as library code.
/// Returned pairs carry the matched root so archive paths stay relative.
pub(crate) fn select_local_sources(roots: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();
    for root in roots {
        let Ok(root) = root.canonicalize() else {
            continue;
        };
        for entry in WalkDir::new(&root)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry))
            .filter_map(|entry| entry.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_source_file(path) {
                continue;
            }
            if caller::is_library_path(path) {
                continue;
            }
            if seen.insert(path.to_path_buf()) {
                files.push((root.clone(), path.to_path_buf()));
            }
        }
    }
    files
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name == "target" || name.starts_with('.'))
}

fn is_source_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    if name == "Cargo.toml" {
        return true;
    }
    // Snapshot sidecars also end in .rs; bundling them would double sources.
    if name.contains(".script") {
        return false;
    }
    path.extension().is_some_and(|ext| ext == "rs")
}
