use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_preview_from_stdin() {
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("preview").arg("-").write_stdin("# Title\n\n**bold** and `code`");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("■ Title"))
        .stdout(predicate::str::contains("【bold】 and [code]"));
}

#[test]
fn test_preview_windows_line_endings() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("win.md");
    fs::write(&input, "| A | B |\r\n|---|---|\r\n| 1 | 2 |\r\n").unwrap();

    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("preview").arg(&input);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1、A：1\n2、B：2"))
        .stdout(predicate::str::contains("|").not());
}

#[test]
fn test_preview_lines_shows_height() {
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("preview").arg("-").arg("--lines").write_stdin("one\ntwo");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("40.0  one"))
        .stdout(predicate::str::contains("height: 300.0"));
}

#[test]
fn test_inspect_prints_json() {
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("inspect")
        .arg("-")
        .write_stdin("# Intro\n\nrun `ls`\n\n```\nunclosed");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"technical\""))
        .stdout(predicate::str::contains("\"anchor\": \"intro\""))
        .stdout(predicate::str::contains("unclosed code block"));
}

#[test]
fn test_render_png() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.md");
    let output = dir.path().join("note.png");
    fs::write(&input, "# Card\n\n- first\n- second").unwrap();

    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("render")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--scale")
        .arg("1");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"width\":750"))
        .stdout(predicate::str::contains("\"format\":\"png\""));

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
}

#[test]
fn test_render_with_config_file_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("card.toml");
    let store = dir.path().join("store");
    let output = dir.path().join("dark.jpg");
    fs::write(
        &config,
        "background_color = \"#000000\"\nexport_format = \"jpeg\"\nquality_scale = 1.0\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("render")
        .arg("-")
        .arg("-o")
        .arg(&output)
        .arg("--config")
        .arg(&config)
        .arg("--store")
        .arg(&store)
        .arg("--data-uri")
        .write_stdin("dark card");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("data:image/jpeg;base64,"));

    let bytes = fs::read(&output).unwrap();
    assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
    assert_eq!(fs::read(store.join("dark.jpg")).unwrap(), bytes);

    let saved = fs::read_to_string(store.join("settings.json")).unwrap();
    assert!(saved.contains("\"background_color\": \"#000000\""));
    assert!(saved.contains("\"export_format\": \"jpeg\""));
}

#[test]
fn test_render_empty_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("render")
        .arg("-")
        .arg("-o")
        .arg(dir.path().join("empty.png"))
        .write_stdin("   \n");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("input is empty"));
}

#[test]
fn test_render_rejects_bad_background() {
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("render").arg("-").arg("--background").arg("blue");

    cmd.assert().failure();
}

#[test]
fn test_missing_input_file() {
    let mut cmd = cargo_bin_cmd!("mdcard");
    cmd.arg("preview").arg("does-not-exist.md");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.md"));
}
