//! Diff Reconciler
//!
//! Holds the original text of every file and the generated changes, and
//! produces the single active [`DiffRecord`] for a selected file.

use crate::changes::{changed_variant_key, CodeExtractor};
use crate::error::ApiError;
use crate::tree::Directory;
use crate::types::{ChangedFilesMap, OriginalFilesMap, PATH_SEPARATOR};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Original and changed text of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffRecord {
    pub file_name: String,
    pub original: String,
    pub changed: String,
}

impl DiffRecord {
    /// Label for the changed side, e.g. `a(change).py`.
    pub fn changed_label(&self) -> String {
        changed_variant_key(&self.file_name)
    }

    pub fn is_identical(&self) -> bool {
        self.original == self.changed
    }
}

pub struct DiffReconciler {
    extractor: CodeExtractor,
    baseline: OriginalFilesMap,
    originals: OriginalFilesMap,
    changed: ChangedFilesMap,
    active: Option<DiffRecord>,
}

impl DiffReconciler {
    pub fn new(language: &str) -> Result<Self, ApiError> {
        Ok(Self {
            extractor: CodeExtractor::new(language)?,
            baseline: OriginalFilesMap::new(),
            originals: OriginalFilesMap::new(),
            changed: ChangedFilesMap::new(),
            active: None,
        })
    }

    /// Read every file in `directory` into the originals map.
    ///
    /// Unreadable files are stored as empty text.
    pub async fn capture(&mut self, directory: &Directory) {
        let reads = directory.files().map(|(handle, path)| async move {
            let text = match handle.read_text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to read original file");
                    String::new()
                }
            };
            (path, text)
        });
        let originals: OriginalFilesMap = join_all(reads).await.into_iter().collect();
        info!(files = originals.len(), "Captured original files");
        self.baseline = originals.clone();
        self.originals = originals;
    }

    /// Store the generated changes and fold their extracted code into the
    /// originals map.
    pub fn apply(&mut self, changed: ChangedFilesMap) {
        for (path, text) in &changed {
            let code = self.extractor.extract(text);
            debug!(path = %path, chars = code.len(), "Applying generated change");
            self.originals.insert(path.clone(), code);
        }
        self.changed = changed;
    }

    /// Make the diff for `path` the active record.
    ///
    /// The original side is the current originals entry, which already holds
    /// the applied code once a generation run has completed.
    pub fn diff_for(&mut self, path: &str) -> Result<&DiffRecord, ApiError> {
        let record = self.record(path, &self.originals)?;
        Ok(&*self.active.insert(record))
    }

    /// Diff of `path` against the text captured when the last generation run
    /// started. Does not touch the active record.
    pub fn baseline_diff(&self, path: &str) -> Result<DiffRecord, ApiError> {
        self.record(path, &self.baseline)
    }

    fn record(&self, path: &str, originals: &OriginalFilesMap) -> Result<DiffRecord, ApiError> {
        let changed = self
            .changed
            .get(path)
            .ok_or_else(|| ApiError::NotFound(format!("no generated change for {}", path)))?;
        Ok(DiffRecord {
            file_name: path
                .rsplit(PATH_SEPARATOR)
                .next()
                .unwrap_or(path)
                .to_string(),
            original: originals.get(path).cloned().unwrap_or_default(),
            changed: self.extractor.extract(changed),
        })
    }

    pub fn active(&self) -> Option<&DiffRecord> {
        self.active.as_ref()
    }

    pub fn is_changed(&self, path: &str) -> bool {
        self.changed.contains_key(path)
    }

    pub fn baseline(&self) -> &OriginalFilesMap {
        &self.baseline
    }

    pub fn originals(&self) -> &OriginalFilesMap {
        &self.originals
    }

    pub fn changed(&self) -> &ChangedFilesMap {
        &self.changed
    }
}
