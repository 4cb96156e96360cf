use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Writes `yaml` to a `docent.yaml` inside a fresh tempdir and returns both.
/// The tempdir guard must stay alive for as long as the path is used.
#[allow(dead_code)]
pub fn temp_config_file(yaml: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create tempdir");
    let path = dir.path().join("docent.yaml");
    fs::write(&path, yaml).expect("failed to write docent.yaml");
    (dir, path)
}
