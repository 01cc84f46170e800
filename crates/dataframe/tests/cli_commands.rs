#![cfg(all(unix, feature = "cli"))]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use dataframe::frame::{read_documents, write_documents, Frame};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "dataframe-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dataframe"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("dataframe should run")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path should be UTF-8")
}

fn write_stream(dir: &Path, frames: &[Frame]) -> PathBuf {
    let path = dir.join("docs.bin");
    let wire = write_documents(frames).expect("frames should encode");
    std::fs::write(&path, &wire).expect("stream should be writable");
    path
}

fn sample() -> Frame {
    let mut c = Frame::new();
    c.add("c", 5i32).unwrap();
    let mut b = Frame::new();
    b.add("b", c).unwrap();
    let mut root = Frame::new();
    root.add("a", b).unwrap();
    root.add("name", "root").unwrap();
    root
}

#[test]
fn encode_then_decode_round_trips_json() {
    let dir = unique_temp_dir("roundtrip");
    let json_path = dir.join("in.json");
    let bin_path = dir.join("out.bin");
    std::fs::write(&json_path, r#"{"one":1,"list":[1,"two"]}{}{"flag":true}"#).unwrap();

    let encoded = run(&["encode", path_arg(&json_path), "--output", path_arg(&bin_path)]);
    assert!(encoded.status.success());

    let wire = std::fs::read(&bin_path).unwrap();
    assert_eq!(read_documents(&wire).unwrap().len(), 3);

    let decoded = run(&["decode", path_arg(&bin_path)]);
    assert!(decoded.status.success());
    let stdout = String::from_utf8_lossy(&decoded.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, [r#"{"one":1,"list":[1,"two"]}"#, "{}", r#"{"flag":true}"#]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_pretty_is_indented() {
    let dir = unique_temp_dir("pretty");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&["decode", path_arg(&bin_path), "--pretty"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\n  \"name\": \"root\""));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decode_reads_writer_config_file() {
    let dir = unique_temp_dir("config");
    let bin_path = write_stream(&dir, &[sample()]);
    let config_path = dir.join("writer.json");
    std::fs::write(&config_path, r#"{"style":"pretty"}"#).unwrap();

    let output = run(&["decode", path_arg(&bin_path), "--config", path_arg(&config_path)]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\n  \"a\": {"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn digest_matches_library() {
    let dir = unique_temp_dir("digest");
    let frame = sample();
    let bin_path = write_stream(&dir, std::slice::from_ref(&frame));

    let output = run(&["--format", "json", "digest", path_arg(&bin_path)]);
    assert!(output.status.success());
    let row: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("digest should emit json");
    assert_eq!(
        row.get("digest").and_then(|v| v.as_str()),
        Some(frame.digest_hex().as_str())
    );
    assert_eq!(row.get("document").and_then(|v| v.as_u64()), Some(1));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn select_fields_by_pattern() {
    let dir = unique_temp_dir("select");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&["--format", "json", "select", path_arg(&bin_path), "a.b.*"]);
    assert!(output.status.success());
    let row: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(row.get("name").and_then(|v| v.as_str()), Some("c"));
    assert_eq!(row.get("value").and_then(|v| v.as_i64()), Some(5));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn select_frames_with_provenance() {
    let dir = unique_temp_dir("select-frames");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&[
        "--format",
        "json",
        "select",
        path_arg(&bin_path),
        "a.b",
        "--frames",
        "--path-field",
        "_path",
    ]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        r#"{"c":5,"_path":"a.b"}"#
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn select_without_match_exits_1() {
    let dir = unique_temp_dir("select-miss");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&["--format", "json", "select", path_arg(&bin_path), "missing.*"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn malformed_pattern_is_usage_error() {
    let dir = unique_temp_dir("select-bad");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&["select", path_arg(&bin_path), "a..b"]);
    assert_eq!(output.status.code(), Some(64));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn truncated_stream_is_data_invalid() {
    let dir = unique_temp_dir("truncated");
    let bin_path = write_stream(&dir, &[sample()]);
    let mut wire = std::fs::read(&bin_path).unwrap();
    wire.truncate(wire.len() - 3);
    std::fs::write(&bin_path, &wire).unwrap();

    let output = run(&["decode", path_arg(&bin_path)]);
    assert_eq!(output.status.code(), Some(60));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn deeply_nested_stream_is_data_invalid() {
    // one document: 20,000 frames named `a` around `c: 5i8`
    let levels = 20_000usize;
    let inner = [4u8, 1, b'c', 5];
    let header = 7usize;
    let mut wire = Vec::with_capacity((levels + 1) * header + inner.len());
    for level in (0..=levels).rev() {
        let body_len = (level * header + inner.len()) as u32;
        let name: &[u8] = if level == levels { &[] } else { b"a" };
        wire.extend_from_slice(&[0, name.len() as u8]);
        wire.extend_from_slice(name);
        wire.extend_from_slice(&body_len.to_be_bytes());
    }
    wire.extend_from_slice(&inner);

    let dir = unique_temp_dir("deep");
    let bin_path = dir.join("deep.bin");
    std::fs::write(&bin_path, &wire).unwrap();

    for command in [&["select", "**.c"][..], &["decode"][..], &["inspect"][..]] {
        let mut args = command.to_vec();
        args.push(path_arg(&bin_path));
        let output = run(&args);
        assert_eq!(output.status.code(), Some(60), "{command:?}");
        assert!(String::from_utf8_lossy(&output.stderr).contains("nesting"));
    }

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_json_input_is_data_invalid() {
    let dir = unique_temp_dir("bad-json");
    let json_path = dir.join("in.json");
    std::fs::write(&json_path, "[5,]").unwrap();

    let output = run(&["encode", path_arg(&json_path), "--output", path_arg(&dir.join("o.bin"))]);
    assert_eq!(output.status.code(), Some(60));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn inspect_lists_nested_paths() {
    let dir = unique_temp_dir("inspect");
    let bin_path = write_stream(&dir, &[sample()]);

    let output = run(&["--format", "json", "inspect", path_arg(&bin_path)]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let paths: Vec<String> = stdout
        .lines()
        .map(|line| {
            let row: serde_json::Value = serde_json::from_str(line).unwrap();
            row["path"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(paths, ["a", "a.b", "a.b.c", "name"]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn version_reports_package_version() {
    let output = run(&["version"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("dataframe {}", env!("CARGO_PKG_VERSION"))
    );
}
