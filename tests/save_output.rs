//! Integration test for the manual save API.

use whichscript::save_output;

#[test]
fn save_output_creates_metadata_and_script_copy() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("result.txt");

    let metadata_path = save_output("hello", &output).expect("save_output");

    assert!(output.is_file(), "output file was not created");
    assert_eq!(
        std::fs::read_to_string(&output).expect("read output"),
        "hello"
    );
    assert!(metadata_path.is_file(), "metadata sidecar was not created");

    let metadata: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&metadata_path).expect("read metadata"))
            .expect("parse metadata");
    let script_path = metadata["script_path"]
        .as_str()
        .expect("script_path recorded");
    assert!(
        script_path.ends_with("save_output.rs"),
        "attributed to {script_path}"
    );
    assert!(metadata["script_sha256"].as_str().is_some());
    assert!(metadata["created_at"].as_str().is_some());
    assert_eq!(metadata["runtime"]["os"], std::env::consts::OS);
    assert!(
        metadata.get("open_params").is_none() || metadata["open_params"].is_null(),
        "manual saves carry no open params"
    );

    let snapshot = dir.path().join("result.txt.script.rs");
    assert!(snapshot.is_file(), "script snapshot was not created");
    let snapshot_text = std::fs::read_to_string(&snapshot).expect("read snapshot");
    let own_source = std::fs::read_to_string(file!()).expect("read own source");
    assert_eq!(
        snapshot_text, own_source,
        "snapshot must match the calling source"
    );
}

#[test]
fn save_output_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("nested").join("deep").join("result.txt");

    save_output(b"payload".as_slice(), &output).expect("save_output");

    assert!(output.is_file());
    assert!(output
        .parent()
        .expect("parent")
        .join("result.txt.metadata.json")
        .is_file());
}
