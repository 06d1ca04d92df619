//! Pipeline Session
//!
//! Owns the state of one pipeline run: the ingested tree and the flat stores
//! keyed by relative path. Stages run in order (ingest, annotate, select,
//! generate); each stage replaces its own store and clears the stores that
//! depend on it.
//!
//! Missing prerequisites are reported as [`ApiError::Precondition`]. A stage
//! whose remote service fails returns `Ok(None)` (or an empty map) and leaves
//! earlier stores untouched.

use crate::annotation::{AnnotationPrompt, Annotator};
use crate::backend::{fetch_precomputed, HttpBackend, PipelineBackend};
use crate::changes::ChangeGenerator;
use crate::config::{xdg, CodeplanConfig, IngestConfig};
use crate::diff::{DiffReconciler, DiffRecord};
use crate::error::ApiError;
use crate::ingest::{scan_directory, FileHandle};
use crate::plan::PlanAnalyzer;
use crate::progress::{tick_while, NoopProgress, ProgressSink, Stage, StageProgress};
use crate::provider::{create_provider_client, ModelProviderClient};
use crate::selection::PlanSelector;
use crate::tree::{Directory, TreeBuilder};
use crate::types::{AnnotationMap, ChangePlan, ChangedFilesMap, FeatureDescription, SelectionMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Interval between simulated progress steps for single-request stages
const PENDING_TICK: Duration = Duration::from_millis(500);
const PENDING_STEP: u8 = 10;

pub struct PipelineSession {
    backend: Arc<dyn PipelineBackend>,
    annotator: Annotator,
    sink: Arc<dyn ProgressSink>,
    ingest: IngestConfig,
    directory: Option<Directory>,
    annotations: Option<AnnotationMap>,
    plan: Option<ChangePlan>,
    selection: Option<SelectionMap>,
    /// The selection came from the precomputed artifacts and does not depend
    /// on the current plan.
    precomputed_selection: bool,
    diff: DiffReconciler,
}

impl PipelineSession {
    pub fn new(
        provider: Arc<dyn ModelProviderClient>,
        backend: Arc<dyn PipelineBackend>,
        ingest: IngestConfig,
    ) -> Result<Self, ApiError> {
        ingest.validate().map_err(ApiError::ConfigError)?;
        let annotator = Annotator::new(provider)
            .with_backend(backend.clone())
            .with_prompt(AnnotationPrompt::with_language(ingest.language.clone()));
        Ok(Self {
            diff: DiffReconciler::new(&ingest.language)?,
            backend,
            annotator,
            sink: Arc::new(NoopProgress),
            ingest,
            directory: None,
            annotations: None,
            plan: None,
            selection: None,
            precomputed_selection: false,
        })
    }

    /// Build a session with HTTP clients for the configured services.
    pub fn from_config(config: &CodeplanConfig) -> Result<Self, ApiError> {
        let provider = create_provider_client(&config.provider)?;
        let backend: Arc<dyn PipelineBackend> = Arc::new(HttpBackend::new(config.backend.clone())?);
        let language = config.ingest.language.clone();
        let prompt = match &config.annotation.prompt_file {
            Some(prompt_file) => {
                AnnotationPrompt::from_file(prompt_file, &xdg::prompts_dir()?, language)?
            }
            None => AnnotationPrompt::with_language(language),
        };
        let annotator = Annotator::new(provider.clone())
            .with_backend(backend.clone())
            .with_prompt(prompt)
            .with_options(config.provider.default_options.clone());
        Ok(Self::new(provider, backend, config.ingest.clone())?.with_annotator(annotator))
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Build the tree from `handles` and reset every downstream store.
    pub fn ingest(&mut self, handles: Vec<FileHandle>) -> Result<&Directory, ApiError> {
        let directory = TreeBuilder::build(handles)
            .ok_or_else(|| ApiError::Precondition("no visible files to ingest".to_string()))?;
        Ok(self.replace_directory(directory))
    }

    /// Scan `root` on disk and ingest the matching files.
    pub fn ingest_dir(&mut self, root: &Path) -> Result<&Directory, ApiError> {
        let handles = scan_directory(root, &self.ingest.extensions)?;
        self.ingest(handles)
    }

    /// Adopt an already built tree.
    pub fn load_directory(&mut self, directory: Directory) -> &Directory {
        self.replace_directory(directory)
    }

    fn replace_directory(&mut self, directory: Directory) -> &Directory {
        info!(
            root = %directory.name,
            files = directory.file_count(),
            "Directory ingested"
        );
        self.annotations = None;
        self.clear_selection();
        self.directory.insert(directory)
    }

    /// Annotate every file of the ingested tree.
    #[instrument(skip(self))]
    pub async fn annotate(&mut self) -> Result<&AnnotationMap, ApiError> {
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("no directory ingested".to_string()))?;
        let progress = StageProgress::start(Stage::Annotation, self.sink.clone());
        let annotations = self.annotator.annotate(directory.files(), &progress).await;
        self.clear_selection();
        Ok(&*self.annotations.insert(annotations))
    }

    /// Ask the plan analysis service for a change plan.
    pub async fn analyze_feature(
        &mut self,
        description: &FeatureDescription,
    ) -> Result<Option<&ChangePlan>, ApiError> {
        if description.as_str().trim().is_empty() {
            return Err(ApiError::Precondition(
                "feature description is empty".to_string(),
            ));
        }
        let progress = StageProgress::start(Stage::Analysis, self.sink.clone());
        let analyzer = PlanAnalyzer::new(self.backend.clone());
        let plan = tick_while(
            analyzer.analyze(description),
            &progress,
            PENDING_TICK,
            PENDING_STEP,
        )
        .await;
        progress.finish();
        match plan {
            Some(plan) => {
                self.invalidate_plan_selection();
                Ok(Some(&*self.plan.insert(plan)))
            }
            None => Ok(None),
        }
    }

    /// Use an externally supplied change plan.
    pub fn set_plan(&mut self, plan: ChangePlan) -> Result<(), ApiError> {
        if plan.is_blank() {
            return Err(ApiError::Precondition("change plan is empty".to_string()));
        }
        self.invalidate_plan_selection();
        self.plan = Some(plan);
        Ok(())
    }

    /// Select the files relevant to the current plan.
    ///
    /// `Ok(None)` when the selection service is unavailable; the previous
    /// selection is cleared either way.
    pub async fn select(&mut self) -> Result<Option<&SelectionMap>, ApiError> {
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("no change plan".to_string()))?;
        let annotations = self
            .annotations
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("files have not been annotated".to_string()))?;

        // Field-wise clear (same as `clear_selection`) so the plan/annotation borrows stay valid.
        self.selection = None;
        self.precomputed_selection = false;
        let progress = StageProgress::start(Stage::Selection, self.sink.clone());
        let selector = PlanSelector::new(self.backend.clone());
        let selection = tick_while(
            selector.select(plan, annotations),
            &progress,
            PENDING_TICK,
            PENDING_STEP,
        )
        .await;
        progress.finish();
        match selection {
            Some(selection) => Ok(Some(&*self.selection.insert(selection))),
            None => Ok(None),
        }
    }

    /// Replace annotations and selection with the backend's precomputed pair.
    ///
    /// On failure nothing is replaced. The loaded selection survives a later
    /// plan change; a new selection run or new annotations replace it.
    pub async fn load_precomputed(&mut self) -> Result<(), ApiError> {
        let artifacts = fetch_precomputed(self.backend.as_ref()).await?;
        self.annotations = Some(artifacts.annotations);
        self.selection = Some(artifacts.selection);
        self.precomputed_selection = true;
        Ok(())
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.precomputed_selection = false;
    }

    /// A new plan invalidates a selection made against the old one.
    fn invalidate_plan_selection(&mut self) {
        if !self.precomputed_selection {
            self.selection = None;
        }
    }

    /// Generate changes for the selected files and fold them into the
    /// originals store.
    ///
    /// Originals are captured from the tree when the run starts.
    pub async fn generate(&mut self) -> Result<&ChangedFilesMap, ApiError> {
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("no directory ingested".to_string()))?;
        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("no change plan".to_string()))?;
        let selection = self
            .selection
            .as_ref()
            .ok_or_else(|| ApiError::Precondition("no file selection".to_string()))?;
        let empty = AnnotationMap::new();
        let annotations = self.annotations.as_ref().unwrap_or(&empty);

        let progress = StageProgress::start(Stage::Generation, self.sink.clone());
        self.diff.capture(directory).await;
        let generator = ChangeGenerator::new(self.backend.clone());
        let changed = tick_while(
            generator.generate(self.diff.originals(), selection, annotations, plan),
            &progress,
            PENDING_TICK,
            PENDING_STEP,
        )
        .await;
        self.diff.apply(changed);
        progress.finish();
        Ok(self.diff.changed())
    }

    /// Make the diff for `path` the active record.
    pub fn diff_for(&mut self, path: &str) -> Result<&DiffRecord, ApiError> {
        self.diff.diff_for(path)
    }

    /// Flip the expanded flag of the root or a nested directory and return
    /// the new state.
    pub fn toggle_expanded(&mut self, path: &str) -> Result<bool, ApiError> {
        let directory = self
            .directory
            .as_mut()
            .ok_or_else(|| ApiError::Precondition("no directory ingested".to_string()))?;
        if !directory.toggle_expanded(path) {
            return Err(ApiError::NotFound(format!("directory {}", path)));
        }
        directory
            .is_expanded(path)
            .ok_or_else(|| ApiError::NotFound(format!("directory {}", path)))
    }

    pub fn directory(&self) -> Option<&Directory> {
        self.directory.as_ref()
    }

    pub fn annotations(&self) -> Option<&AnnotationMap> {
        self.annotations.as_ref()
    }

    pub fn plan(&self) -> Option<&ChangePlan> {
        self.plan.as_ref()
    }

    pub fn selection(&self) -> Option<&SelectionMap> {
        self.selection.as_ref()
    }

    pub fn diff(&self) -> &DiffReconciler {
        &self.diff
    }

    pub fn language(&self) -> &str {
        &self.ingest.language
    }
}
