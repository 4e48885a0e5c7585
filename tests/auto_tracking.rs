//! Integration tests for global write interception.
//!
//! These tests share process-global state (the toggle and the config), so
//! each one holds a lock for its whole body.

use once_cell::sync::Lazy;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use whichscript::{ArchiveOptions, TrackerConfig};

static GLOBAL_STATE: Lazy<Mutex<()>> = Lazy::new(Mutex::default);

fn lock_global_state() -> MutexGuard<'static, ()> {
    GLOBAL_STATE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).expect("read json")).expect("parse json")
}

#[test]
fn metadata_and_snapshot_created_on_write() {
    let _guard = lock_global_state();
    whichscript::enable_tracking();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("file.txt");
    let mut file = whichscript::create(&path).expect("create");
    file.write_all(b"hello").expect("write");
    drop(file);

    whichscript::disable_tracking();

    let metadata_path = dir.path().join("file.txt.metadata.json");
    assert!(metadata_path.is_file(), "metadata sidecar missing");
    let metadata = read_json(&metadata_path);
    assert_eq!(metadata["open_params"]["write"], true);
    assert_eq!(metadata["open_params"]["append"], false);
    let script_path = metadata["script_path"].as_str().expect("script_path");
    assert!(
        script_path.ends_with("auto_tracking.rs"),
        "attributed to {script_path}"
    );
    assert!(
        dir.path().join("file.txt.script.rs").is_file(),
        "snapshot missing"
    );
}

#[test]
fn read_opens_are_not_recorded() {
    let _guard = lock_global_state();
    whichscript::enable_tracking();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("file2.txt");
    std::fs::write(&path, "data").expect("seed file");

    let _file = whichscript::OpenOptions::new()
        .read(true)
        .open(&path)
        .expect("open");

    whichscript::disable_tracking();

    assert!(!dir.path().join("file2.txt.metadata.json").exists());
    assert!(!dir.path().join("file2.txt.script.rs").exists());
}

#[test]
fn append_opens_are_recorded() {
    let _guard = lock_global_state();
    whichscript::enable_tracking();

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("log.txt");
    let mut file = whichscript::append(&path).expect("append");
    writeln!(file, "line").expect("write");
    drop(file);

    whichscript::disable_tracking();

    let metadata = read_json(&dir.path().join("log.txt.metadata.json"));
    assert_eq!(metadata["open_params"]["append"], true);
    assert_eq!(metadata["open_params"]["write"], false);
}

#[test]
fn archive_bundle_written_when_configured() {
    let _guard = lock_global_state();

    let dir = tempfile::tempdir().expect("tempdir");
    let archive_root = dir.path().join("archive");
    whichscript::configure(TrackerConfig {
        archive: Some(ArchiveOptions {
            archive_root: archive_root.clone(),
            local_roots: Vec::new(),
            max_files: 10,
            max_bytes: 10_000_000,
        }),
        ..TrackerConfig::default()
    });
    whichscript::enable_tracking();

    let path = dir.path().join("out.txt");
    let mut file = whichscript::create(&path).expect("create");
    file.write_all(b"payload").expect("write");
    drop(file);

    whichscript::disable_tracking();
    whichscript::configure(TrackerConfig::default());

    let zip_path = find_archive_zip(&archive_root.join("out.txt"));
    let file = std::fs::File::open(&zip_path).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("read zip");
    let mut names = Vec::new();
    for index in 0..archive.len() {
        names.push(archive.by_index(index).expect("entry").name().to_string());
    }

    assert!(names.contains(&"metadata.json".to_string()), "{names:?}");
    assert!(
        names.iter().any(|name| name.starts_with("script")),
        "{names:?}"
    );
    // Local roots default to the calling script's directory, so this test's
    // own source lands under deps/.
    assert!(
        names
            .iter()
            .any(|name| name.starts_with("deps/") && name.ends_with("auto_tracking.rs")),
        "{names:?}"
    );
}

fn find_archive_zip(per_output_dir: &Path) -> PathBuf {
    assert!(
        per_output_dir.is_dir(),
        "archive directory missing: {}",
        per_output_dir.display()
    );
    walkdir::WalkDir::new(per_output_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path().to_path_buf())
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(".ws.zip"))
        })
        .expect("archive zip not found")
}
