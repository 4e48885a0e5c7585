//! Integration tests for the whichscript binary.

use std::path::Path;
use std::process::Command;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_whichscript")
}

#[test]
fn open_print_only_resolves_the_snapshot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("out.csv");
    let snapshot = dir.path().join("out.csv.script.rs");
    std::fs::write(&output, "a,b\n").expect("write output");
    std::fs::write(&snapshot, "fn main() {}\n").expect("write snapshot");

    let result = Command::new(bin())
        .arg("open")
        .arg(&output)
        .arg("--print-only")
        .output()
        .expect("run whichscript");

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert_eq!(stdout.trim(), snapshot.display().to_string());
}

#[test]
fn open_missing_output_exits_2() {
    let dir = tempfile::tempdir().expect("tempdir");
    let result = Command::new(bin())
        .arg("open")
        .arg(dir.path().join("never-written.txt"))
        .output()
        .expect("run whichscript");
    assert_eq!(result.status.code(), Some(2));
}

#[test]
fn open_without_sidecars_exits_3() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("bare.txt");
    std::fs::write(&output, "data").expect("write output");

    let result = Command::new(bin())
        .arg("open")
        .arg(&output)
        .output()
        .expect("run whichscript");
    assert_eq!(result.status.code(), Some(3));
}

#[test]
fn info_prints_the_metadata_sidecar() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("result.txt");
    whichscript::save_output("hello", &output).expect("save_output");

    let result = Command::new(bin())
        .arg("info")
        .arg(&output)
        .output()
        .expect("run whichscript");

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    let metadata: serde_json::Value = serde_json::from_str(&stdout).expect("parse info output");
    assert!(
        metadata["script_path"]
            .as_str()
            .is_some_and(|path| path.ends_with("cli.rs")),
        "stdout: {stdout}"
    );
}

#[test]
fn archive_subcommand_bundles_sidecars() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("result.txt");
    let archive_root = dir.path().join("archive");
    whichscript::save_output("hello", &output).expect("save_output");

    let result = Command::new(bin())
        .arg("archive")
        .arg(&output)
        .arg("--archive-root")
        .arg(&archive_root)
        .arg("--local-root")
        .arg(dir.path())
        .output()
        .expect("run whichscript");

    assert!(
        result.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    let reported = stdout
        .trim()
        .strip_prefix("Wrote archive to ")
        .expect("archive path reported");
    let zip_path = Path::new(reported);
    assert!(zip_path.is_file(), "missing archive at {reported}");

    let file = std::fs::File::open(zip_path).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("read zip");
    let mut names = Vec::new();
    for index in 0..archive.len() {
        names.push(archive.by_index(index).expect("entry").name().to_string());
    }
    assert!(names.contains(&"metadata.json".to_string()), "{names:?}");
    assert!(names.contains(&"script.rs".to_string()), "{names:?}");
}
