//! Output metadata descriptors.
//!
//! One descriptor is written per tracked write, pretty-printed so humans can
//! read sidecars without tooling.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Descriptor written as `<output>.metadata.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OutputMetadata {
    /// Absolute path of the attributed calling script, when one resolved.
    pub script_path: Option<PathBuf>,
    /// Open flags of the intercepted write; absent for the manual save API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_params: Option<OpenParams>,
    /// Facts about the producing process.
    pub runtime: RuntimeInfo,
    /// Commit state of the repository containing the calling script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
    /// SHA-256 of the calling script's bytes at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_sha256: Option<String>,
    /// RFC 3339 UTC timestamp of the tracked write.
    pub created_at: String,
}

/// Mode flags of the open call that triggered recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OpenParams {
    pub read: bool,
    pub write: bool,
    pub append: bool,
    pub create: bool,
    pub create_new: bool,
    pub truncate: bool,
}

impl OpenParams {
    /// Whether the flags describe a write-mode open worth tracking.
    pub fn writes(&self) -> bool {
        self.write || self.append || self.create_new
    }
}

/// Facts about the process that produced an output.
#[derive(Debug, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub os: String,
    pub arch: String,
    pub pid: u32,
    pub argv: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub user: Option<String>,
    pub tracker_version: String,
}

/// Commit state of a git repository.
#[derive(Debug, Serialize, Deserialize)]
pub struct GitInfo {
    pub commit: String,
    pub dirty: bool,
    pub branch: Option<String>,
}

/// Build a descriptor for one tracked write.
pub fn build_metadata(script: Option<&Path>, open_params: Option<OpenParams>) -> OutputMetadata {
    let git = script.and_then(Path::parent).and_then(git_info);
    let script_sha256 = script
        .and_then(|path| fs::read(path).ok())
        .map(|bytes| sha256_hex(&bytes));
    OutputMetadata {
        script_path: script.map(Path::to_path_buf),
        open_params,
        runtime: runtime_info(),
        git,
        script_sha256,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

/// Write a descriptor as pretty JSON, creating parent directories first.
pub fn write_metadata(path: &Path, metadata: &OutputMetadata) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(metadata).context("serialize output metadata")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Load a descriptor from a metadata sidecar.
pub fn read_metadata(path: &Path) -> Result<OutputMetadata> {
    let bytes = fs::read(path).with_context(|| format!("read metadata {}", path.display()))?;
    let metadata = serde_json::from_slice(&bytes).context("parse metadata JSON")?;
    Ok(metadata)
}

fn runtime_info() -> RuntimeInfo {
    RuntimeInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        pid: std::process::id(),
        argv: std::env::args().collect(),
        cwd: std::env::current_dir().ok(),
        user: std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok(),
        tracker_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Commit hash, dirty flag, and branch for the repository containing `dir`.
/// Best effort: `None` when git is missing or `dir` is outside a repo.
pub(crate) fn git_info(dir: &Path) -> Option<GitInfo> {
    let commit = git_stdout(dir, &["rev-parse", "HEAD"]).filter(|hash| !hash.is_empty())?;
    let dirty =
        git_stdout(dir, &["status", "--porcelain"]).is_some_and(|status| !status.is_empty());
    let branch = git_stdout(dir, &["rev-parse", "--abbrev-ref", "HEAD"])
        .filter(|name| !name.is_empty() && name.as_str() != "HEAD");
    Some(GitInfo {
        commit,
        dirty,
        branch,
    })
}

fn git_stdout(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
