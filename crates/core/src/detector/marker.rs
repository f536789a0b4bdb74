//! Sources of in-progress markers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Lists the in-progress markers currently present.
#[async_trait]
pub trait MarkerSource: Send + Sync {
    async fn in_progress(&self) -> std::io::Result<Vec<PathBuf>>;
}

/// Markers are files in `dir` with a given extension.
#[derive(Debug, Clone)]
pub struct FsMarkerSource {
    dir: PathBuf,
    extension: String,
}

impl FsMarkerSource {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Case-insensitive extension match.
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}

#[async_trait]
impl MarkerSource for FsMarkerSource {
    async fn in_progress(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut markers = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if has_extension(&path, &self.extension) {
                markers.push(path);
            }
        }
        markers.sort();
        Ok(markers)
    }
}
