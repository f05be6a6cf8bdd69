use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn write_config(root: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = root.path().join("cache.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn json_report_reflects_short_thresholds() {
    let root = TempDir::new().unwrap();
    let config = write_config(
        &root,
        r#"
version = 1

[cache]
kill_after = "1s"
delete_after = 2
"#,
    );

    let output = Command::new(env!("CARGO_BIN_EXE_texreplay"))
        .env_remove("TEXREPLAY_CONFIG")
        .arg("--config")
        .arg(&config)
        .args(["--frames", "150", "--textures", "8", "--json"])
        .output()
        .expect("failed to run texreplay");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["frames"], 150);
    assert_eq!(report["textures"], 8);
    assert!(report["stats"]["hits"].as_u64().unwrap() > 0);
    assert!(report["evicted"].as_u64().unwrap() > 0);
    assert!(report["stats"]["revived"].as_u64().unwrap() > 0);
}

#[test]
fn summary_is_printed_by_default() {
    let output = Command::new(env!("CARGO_BIN_EXE_texreplay"))
        .env_remove("TEXREPLAY_CONFIG")
        .args(["--frames", "20", "--textures", "4"])
        .output()
        .expect("failed to run texreplay");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Replayed 20 frames over 4 textures"));
    assert!(stdout.contains("hit rate"));
}

#[test]
fn invalid_config_fails() {
    let root = TempDir::new().unwrap();
    let config = write_config(&root, "version = 2\n");

    let output = Command::new(env!("CARGO_BIN_EXE_texreplay"))
        .arg("--config")
        .arg(&config)
        .output()
        .expect("failed to run texreplay");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unsupported config version"), "{stderr}");
}

#[test]
fn dump_dir_receives_pngs() {
    let root = TempDir::new().unwrap();
    let dumps = root.path().join("dumps");
    let config = write_config(
        &root,
        &format!(
            "version = 1\n\n[loading]\ndump_textures = true\ndump_dir = {:?}\n",
            dumps.display().to_string()
        ),
    );

    let status = Command::new(env!("CARGO_BIN_EXE_texreplay"))
        .arg("--config")
        .arg(&config)
        .args(["--frames", "2", "--textures", "3"])
        .status()
        .expect("failed to run texreplay");

    assert!(status.success());
    let pngs = fs::read_dir(&dumps)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "png"))
        .count();
    assert!(pngs >= 2);
}
