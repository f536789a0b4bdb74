//! Directory snapshots for identifying new artifacts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::marker::has_extension;

/// Regular files in a directory with their modification times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    files: BTreeMap<PathBuf, SystemTime>,
}

impl DirectorySnapshot {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Most recently modified file.
    pub fn latest(&self) -> Option<&Path> {
        self.files
            .iter()
            .max_by_key(|(_, mtime)| **mtime)
            .map(|(path, _)| path.as_path())
    }

    /// Files present here but not in `before`, oldest first.
    pub fn new_since(&self, before: &DirectorySnapshot) -> Vec<PathBuf> {
        let mut added: Vec<_> = self
            .files
            .iter()
            .filter(|(path, _)| !before.files.contains_key(*path))
            .collect();
        added.sort_by(|a, b| (a.1, a.0).cmp(&(b.1, b.0)));
        added.into_iter().map(|(path, _)| path.clone()).collect()
    }
}

impl FromIterator<(PathBuf, SystemTime)> for DirectorySnapshot {
    fn from_iter<I: IntoIterator<Item = (PathBuf, SystemTime)>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

/// Capture the regular files in `dir`, skipping in-progress markers.
///
/// Files that disappear between listing and stat are skipped.
pub async fn snapshot_directory(
    dir: &Path,
    marker_extension: &str,
) -> std::io::Result<DirectorySnapshot> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = BTreeMap::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if has_extension(&path, marker_extension) {
            continue;
        }
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e),
        };
        if !metadata.is_file() {
            continue;
        }
        let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        files.insert(path, mtime);
    }

    Ok(DirectorySnapshot { files })
}
