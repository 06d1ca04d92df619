//! Change Generator
//!
//! Sends the selected files, their annotations and the change plan to the
//! generation service and returns the raw generated text per file.

pub mod extract;

use crate::backend::PipelineBackend;
use crate::types::{
    AnnotationMap, ChangePlan, ChangedFilesMap, OriginalFilesMap, SelectionMap, PATH_SEPARATOR,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub use extract::{extract_code, CodeExtractor};

/// Insert `(change)` before the last extension, or append it.
pub fn changed_variant_key(name: &str) -> String {
    match name.rfind('.') {
        Some(index) => format!("{}(change){}", &name[..index], &name[index..]),
        None => format!("{}(change)", name),
    }
}

pub struct ChangeGenerator {
    backend: Arc<dyn PipelineBackend>,
}

impl ChangeGenerator {
    pub fn new(backend: Arc<dyn PipelineBackend>) -> Self {
        Self { backend }
    }

    /// Generate changed text for the selected files.
    ///
    /// Service failure is logged and yields an empty map. Response keys are
    /// mapped back onto the requested relative paths.
    pub async fn generate(
        &self,
        files: &OriginalFilesMap,
        selection: &SelectionMap,
        annotations: &AnnotationMap,
        plan: &ChangePlan,
    ) -> ChangedFilesMap {
        let start = Instant::now();
        let changed = match self
            .backend
            .generate_changes(files, selection, annotations, plan.as_str())
            .await
        {
            Ok(changed) => changed,
            Err(e) => {
                error!(error = %e, "Change generation failed");
                return ChangedFilesMap::new();
            }
        };

        let changed = normalize_keys(changed, files);
        info!(
            changed = changed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Change generation complete"
        );
        changed
    }
}

fn file_name(path: &str) -> &str {
    path.rsplit(PATH_SEPARATOR).next().unwrap_or(path)
}

/// Map response keys onto requested paths.
///
/// A requested path is kept. A bare file name matching exactly one requested
/// path becomes that path. Anything else is kept verbatim.
fn normalize_keys(changed: ChangedFilesMap, requested: &OriginalFilesMap) -> ChangedFilesMap {
    let mut by_name: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for path in requested.keys() {
        by_name.entry(file_name(path)).or_default().push(path);
    }

    let mut normalized = ChangedFilesMap::new();
    for (key, text) in changed {
        if requested.contains_key(&key) {
            normalized.insert(key, text);
            continue;
        }
        match by_name.get(key.as_str()).map(Vec::as_slice) {
            Some([path]) => {
                normalized.insert((*path).to_string(), text);
            }
            Some(paths) => {
                warn!(key = %key, candidates = paths.len(), "Ambiguous changed-file key");
                normalized.insert(key, text);
            }
            None => {
                warn!(key = %key, "Changed-file key matches no requested file");
                normalized.insert(key, text);
            }
        }
    }
    normalized
}
