//! File Ingestion
//!
//! The boundary where source files enter the core. A [`FileHandle`] pairs a
//! relative path (whose first segment is the uploaded folder name) with a way
//! to read the file's text. Handles are read-only to everything downstream.

use crate::error::ApiError;
use crate::tree::filter;
use crate::types::PATH_SEPARATOR;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
enum FileSource {
    Disk(PathBuf),
    Memory(Arc<str>),
}

/// Readable file content plus its relative path
#[derive(Debug, Clone)]
pub struct FileHandle {
    relative_path: String,
    source: FileSource,
}

impl FileHandle {
    /// Handle backed by a file on disk.
    pub fn from_disk(relative_path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: FileSource::Disk(absolute_path.into()),
        }
    }

    /// Handle backed by content already held in memory.
    pub fn in_memory(relative_path: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            relative_path: relative_path.into(),
            source: FileSource::Memory(content.into()),
        }
    }

    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.relative_path
            .rsplit(PATH_SEPARATOR)
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Read the full text content.
    pub async fn read_text(&self) -> Result<String, ApiError> {
        match &self.source {
            FileSource::Disk(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                ApiError::Io(std::io::Error::new(
                    e.kind(),
                    format!("{}: {}", path.display(), e),
                ))
            }),
            FileSource::Memory(content) => Ok(content.to_string()),
        }
    }
}

/// Collect handles for every file under `root` whose extension is listed.
///
/// Relative paths start with the root folder's own name. Hidden entries are
/// not descended into. Output is sorted by path.
pub fn scan_directory(root: &Path, extensions: &[String]) -> Result<Vec<FileHandle>, ApiError> {
    let root = root.canonicalize().map_err(|e| {
        ApiError::ConfigError(format!(
            "Failed to canonicalize source directory {}: {}",
            root.display(),
            e
        ))
    })?;
    if !root.is_dir() {
        return Err(ApiError::Precondition(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ApiError::Precondition(format!("{} has no folder name", root.display()))
        })?;

    let mut handles = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !filter::is_hidden_segment(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Failed to read directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extensions) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let mut relative_path = root_name.clone();
        for component in relative.components() {
            relative_path.push(PATH_SEPARATOR);
            relative_path.push_str(&component.as_os_str().to_string_lossy());
        }
        debug!(path = %relative_path, "Ingested file");
        handles.push(FileHandle::from_disk(relative_path, entry.path()));
    }

    info!(root = %root.display(), files = handles.len(), "Scanned source directory");
    Ok(handles)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|wanted| wanted.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}
