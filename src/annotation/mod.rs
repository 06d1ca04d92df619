//! Annotation Orchestrator
//!
//! Requests one natural-language annotation per file from the model provider.
//! All requests are in flight at once. A failure for one file never affects
//! another: the failed file gets [`ANNOTATION_SENTINEL`] and the batch goes on.
//!
//! Each request future returns its own `(path, text)` slot; slots are merged
//! into the [`AnnotationMap`] after the batch so no map is shared between
//! in-flight requests.

pub mod prompt;

use crate::backend::PipelineBackend;
use crate::error::ApiError;
use crate::ingest::FileHandle;
use crate::progress::StageProgress;
use crate::provider::{CompletionOptions, ModelProviderClient};
use crate::tree::filter::is_visible_path;
use crate::types::{AnnotationMap, ANNOTATION_SENTINEL};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use prompt::{resolve_prompt_path, AnnotationPrompt, DEFAULT_TEMPLATE};

pub struct Annotator {
    provider: Arc<dyn ModelProviderClient>,
    backend: Option<Arc<dyn PipelineBackend>>,
    prompt: AnnotationPrompt,
    options: CompletionOptions,
}

impl Annotator {
    pub fn new(provider: Arc<dyn ModelProviderClient>) -> Self {
        Self {
            provider,
            backend: None,
            prompt: AnnotationPrompt::default(),
            options: CompletionOptions::default(),
        }
    }

    /// Persist each finished batch through `backend`.
    pub fn with_backend(mut self, backend: Arc<dyn PipelineBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_prompt(mut self, prompt: AnnotationPrompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Annotate every visible file.
    ///
    /// The result holds exactly one entry per visible input path. Progress
    /// starts at 0 (the caller's [`StageProgress::start`]), advances after each
    /// completion and ends at 100.
    pub async fn annotate<'a, I>(&self, files: I, progress: &StageProgress) -> AnnotationMap
    where
        I: IntoIterator<Item = (&'a FileHandle, String)>,
    {
        let files: Vec<(&FileHandle, String)> = files
            .into_iter()
            .filter(|(_, path)| {
                let visible = is_visible_path(path);
                if !visible {
                    debug!(path = %path, "Skipping hidden file");
                }
                visible
            })
            .collect();

        let total = files.len();
        let completed = AtomicUsize::new(0);
        let start = Instant::now();
        info!(files = total, model = %self.provider.model(), "Annotating files");

        let requests = files.into_iter().map(|(handle, path)| {
            let completed = &completed;
            async move {
                let text = match self.annotate_one(handle, &path).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(path = %path, error = %e, "Annotation failed");
                        ANNOTATION_SENTINEL.to_string()
                    }
                };
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress.update(done, total);
                (path, text)
            }
        });
        let slots = join_all(requests).await;

        let mut annotations = AnnotationMap::new();
        for (path, text) in slots {
            annotations.insert(path, text);
        }

        let failed = annotations
            .values()
            .filter(|text| text.as_str() == ANNOTATION_SENTINEL)
            .count();
        info!(
            files = total,
            failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Annotation batch complete"
        );

        if let Some(backend) = &self.backend {
            if let Err(e) = backend.save_annotations(&annotations).await {
                warn!(error = %e, "Failed to persist annotations");
            }
        }

        progress.finish();
        annotations
    }

    async fn annotate_one(&self, handle: &FileHandle, path: &str) -> Result<String, ApiError> {
        let content = handle.read_text().await?;
        let prompt = self.prompt.render(path, &content);
        let text = self.provider.complete(&prompt, &self.options).await?;
        debug!(path = %path, chars = text.len(), "Annotation received");
        Ok(text.trim().to_string())
    }
}
