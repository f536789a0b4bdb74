//! Startup behavior of the `setgrab` binary that needs no browser or Tor.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn setgrab(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_setgrab"))
        .args(args)
        .current_dir(dir)
        .env_remove("SETGRAB_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run setgrab")
}

fn write_config(dir: &TempDir, downloads: &Path) -> String {
    let config = format!(
        r#"
downloads_folder_path = "{}"
setlist_path = "{}"

[logging]
file = "{}"
"#,
        downloads.display(),
        dir.path().join("setlist.txt").display(),
        dir.path().join("app.log").display(),
    );
    let path = dir.path().join("config.toml");
    std::fs::write(&path, config).unwrap();
    path.display().to_string()
}

#[test]
fn test_missing_config_exits_with_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    let output = setgrab(dir.path(), &["--config", "nope.toml"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"), "stderr: {}", stderr);
}

#[test]
fn test_dry_run_prints_setlist() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, dir.path());
    std::fs::write(
        dir.path().join("setlist.txt"),
        "Alice - Song*https://www.youtube.com/watch?v=1\n\
         no url here\n\
         https://www.youtube.com/watch?v=2\n",
    )
    .unwrap();

    let output = setgrab(dir.path(), &["--config", &config, "--dry-run"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let items: Vec<&str> = stdout
        .lines()
        .filter(|l| l.contains("youtube.com/watch"))
        .collect();
    assert_eq!(items.len(), 2, "stdout: {}", stdout);
    assert!(items[0].contains("Alice\tSong"));

    let log = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert!(log.contains("skipped"));
}

#[test]
fn test_missing_downloads_folder_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, &dir.path().join("missing"));
    std::fs::write(dir.path().join("setlist.txt"), "https://a.test/1\n").unwrap();

    let output = setgrab(dir.path(), &["--config", &config]);

    assert_eq!(output.status.code(), Some(2));
    let log = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
    assert!(log.contains("detecting downloads from"));
    assert!(log.contains("precondition failed"));
}

#[test]
fn test_setlist_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(&dir, dir.path());
    std::fs::write(dir.path().join("other.txt"), "https://a.test/9\n").unwrap();

    let output = setgrab(
        dir.path(),
        &["--config", &config, "--setlist", "other.txt", "--dry-run"],
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("https://a.test/9"));
}
