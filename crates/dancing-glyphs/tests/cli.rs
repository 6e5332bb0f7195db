use std::fs;
use std::process::{Command, Output};

use tempfile::TempDir;

fn dancing_glyphs(config_dir: &std::path::Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dancing-glyphs"))
        .env("DANCING_GLYPHS_CONFIG_DIR", config_dir)
        .env_remove("DANCING_GLYPHS_CONFIG")
        .env("RUST_LOG", "warn")
        .args(args)
        .output()
        .expect("failed to run dancing-glyphs")
}

#[test]
fn headless_run_renders_every_frame() {
    let root = TempDir::new().unwrap();
    let output = dancing_glyphs(
        root.path(),
        &["--headless", "20", "--sprites", "30", "--seed", "5", "--window", "320x240"],
    );
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("rendered 20 of 20 frames with 30 sprites at 320x240"),
        "{stdout}"
    );
}

#[test]
fn config_save_then_show_round_trips() {
    let root = TempDir::new().unwrap();
    let config_dir = root.path().join("config");

    let saved = dancing_glyphs(
        &config_dir,
        &["--scheme", "light", "--movement", "line", "--sprites", "42", "config", "save"],
    );
    assert!(saved.status.success(), "{saved:?}");
    assert!(config_dir.join("config.toml").exists());

    let shown = dancing_glyphs(&config_dir, &["config", "show"]);
    assert!(shown.status.success(), "{shown:?}");
    let stdout = String::from_utf8_lossy(&shown.stdout);
    assert!(stdout.contains("scheme = \"light\""), "{stdout}");
    assert!(stdout.contains("movement = \"line\""), "{stdout}");
    assert!(stdout.contains("sprites = 42"), "{stdout}");
}

#[test]
fn config_where_reports_the_override_directory() {
    let root = TempDir::new().unwrap();
    let output = dancing_glyphs(root.path(), &["config", "where"]);
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&root.path().display().to_string()), "{stdout}");
    assert!(stdout.contains("missing"), "{stdout}");
}

#[test]
fn invalid_config_file_fails() {
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("config.toml"), "ring_size = 1\n").unwrap();
    let output = dancing_glyphs(root.path(), &["--headless", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ring_size"), "{stderr}");
}

#[test]
fn unknown_scheme_is_rejected_by_the_parser() {
    let root = TempDir::new().unwrap();
    let output = dancing_glyphs(root.path(), &["--scheme", "sepia", "config", "show"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dark, light, mono"), "{stderr}");
}
