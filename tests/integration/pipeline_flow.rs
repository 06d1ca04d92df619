//! End-to-end runs of the pipeline session against in-process fakes.

use super::support::{
    assert_non_decreasing, selection_response, FakeBackend, FakeProvider, RecordingProgress,
};
use codeplan::config::IngestConfig;
use codeplan::error::ApiError;
use codeplan::ingest::FileHandle;
use codeplan::progress::Stage;
use codeplan::types::{
    AnnotationMap, ChangePlan, ChangedFilesMap, FeatureDescription, SelectionMap,
    ANNOTATION_SENTINEL,
};
use codeplan::PipelineSession;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

fn project() -> Vec<FileHandle> {
    vec![
        FileHandle::in_memory("proj/a.py", "print(0)"),
        FileHandle::in_memory("proj/sub/b.py", "b = 1"),
        FileHandle::in_memory("proj/c.py", "c = 1"),
    ]
}

fn session(
    provider: FakeProvider,
    backend: Arc<FakeBackend>,
    progress: Arc<RecordingProgress>,
) -> PipelineSession {
    PipelineSession::new(Arc::new(provider), backend, IngestConfig::default())
        .unwrap()
        .with_progress(progress)
}

#[tokio::test(start_paused = true)]
async fn failed_annotation_stores_sentinel_and_finishes_progress() {
    // Walk order is a.py, c.py, sub/b.py, so c.py is the second request.
    let mut provider = FakeProvider::failing(&["proj/c.py"]);
    provider.delays = BTreeMap::from([
        ("proj/a.py".to_string(), Duration::from_millis(300)),
        ("proj/c.py".to_string(), Duration::from_millis(100)),
    ]);
    let backend = Arc::new(FakeBackend::default());
    let progress = Arc::new(RecordingProgress::default());
    let mut session = session(provider, backend.clone(), progress.clone());

    session.ingest(project()).unwrap();
    let annotations = session.annotate().await.unwrap().clone();

    assert_eq!(annotations.len(), 3);
    assert_eq!(annotations["proj/a.py"], "summary of proj/a.py");
    assert_eq!(annotations["proj/c.py"], ANNOTATION_SENTINEL);
    assert_eq!(annotations["proj/sub/b.py"], "summary of proj/sub/b.py");

    let values = progress.values(Stage::Annotation);
    assert_eq!(values.first(), Some(&0));
    assert_eq!(values.last(), Some(&100));
    assert_non_decreasing(&values);

    // The save failure is logged, not surfaced.
    assert_eq!(backend.saved.lock().len(), 1);
    assert_eq!(backend.saved.lock()[0], annotations);
}

#[tokio::test]
async fn annotation_skips_hidden_entries() {
    let provider = Arc::new(FakeProvider::default());
    let backend = Arc::new(FakeBackend::default());
    let mut session =
        PipelineSession::new(provider.clone(), backend, IngestConfig::default()).unwrap();

    session
        .ingest(vec![
            FileHandle::in_memory("proj/.hidden/x.py", "x"),
            FileHandle::in_memory("proj/.env", "SECRET=1"),
            FileHandle::in_memory("proj/y.py", "y"),
        ])
        .unwrap();
    let annotations = session.annotate().await.unwrap();

    assert_eq!(annotations.keys().collect::<Vec<_>>(), vec!["proj/y.py"]);
    assert_eq!(provider.prompts.lock().len(), 1);
}

#[tokio::test]
async fn annotation_of_a_large_batch_covers_every_file() {
    let handles: Vec<FileHandle> = (0..40)
        .map(|i| FileHandle::in_memory(format!("proj/m{}/f{}.py", i % 4, i), format!("v = {}", i)))
        .collect();
    let progress = Arc::new(RecordingProgress::default());
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        progress.clone(),
    );

    session.ingest(handles).unwrap();
    let annotations = session.annotate().await.unwrap();

    assert_eq!(annotations.len(), 40);
    assert!(annotations.values().all(|t| t.starts_with("summary of proj/m")));
    let values = progress.values(Stage::Annotation);
    assert_non_decreasing(&values);
    assert_eq!(values.last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn selection_without_success_status_is_absent() {
    let backend = Arc::new(FakeBackend {
        selection: Ok(selection_response("error", &[("proj/a.py", "would change")])),
        ..FakeBackend::default()
    });
    let progress = Arc::new(RecordingProgress::default());
    let mut session = session(FakeProvider::default(), backend.clone(), progress.clone());

    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();

    assert!(session.select().await.unwrap().is_none());
    assert!(session.selection().is_none());
    assert_eq!(*backend.select_calls.lock(), 1);
    assert_eq!(progress.values(Stage::Selection).last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn selection_service_error_leaves_annotations_untouched() {
    let backend = Arc::new(FakeBackend {
        selection: Err("503 Service Unavailable".to_string()),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );

    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();

    assert!(session.select().await.unwrap().is_none());
    assert_eq!(session.annotations().map(|a| a.len()), Some(3));
}

#[tokio::test]
async fn stages_report_missing_prerequisites() {
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        Arc::new(RecordingProgress::default()),
    );

    assert!(matches!(session.annotate().await, Err(ApiError::Precondition(_))));
    assert!(matches!(session.select().await, Err(ApiError::Precondition(_))));
    assert!(matches!(session.generate().await, Err(ApiError::Precondition(_))));
    assert!(matches!(
        session.set_plan(ChangePlan::new("   ")),
        Err(ApiError::Precondition(_))
    ));
    assert!(matches!(
        session.ingest(vec![FileHandle::in_memory("proj/.git/HEAD", "ref")]),
        Err(ApiError::Precondition(_))
    ));

    session.ingest(project()).unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();
    // Plan present, annotations missing.
    assert!(matches!(session.select().await, Err(ApiError::Precondition(_))));
    // Plan present, selection missing.
    assert!(matches!(session.generate().await, Err(ApiError::Precondition(_))));
}

#[tokio::test(start_paused = true)]
async fn analysis_stores_plan_and_clears_selection() {
    let progress = Arc::new(RecordingProgress::default());
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        progress.clone(),
    );
    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("old plan")).unwrap();
    session.select().await.unwrap();
    assert!(session.selection().is_some());

    let feature = FeatureDescription::merge("add printing", None).unwrap();
    let plan = session.analyze_feature(&feature).await.unwrap().cloned();

    assert_eq!(plan, Some(ChangePlan::new("1. Change proj/a.py")));
    assert!(session.selection().is_none());
    assert_eq!(progress.values(Stage::Analysis).last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn failed_analysis_keeps_previous_plan() {
    let backend = Arc::new(FakeBackend {
        analysis: Err("timeout".to_string()),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );
    session.set_plan(ChangePlan::new("kept")).unwrap();

    let feature = FeatureDescription::merge("anything", None).unwrap();
    assert!(session.analyze_feature(&feature).await.unwrap().is_none());
    assert_eq!(session.plan(), Some(&ChangePlan::new("kept")));
}

#[tokio::test(start_paused = true)]
async fn slow_analysis_advances_simulated_progress_below_completion() {
    struct SlowBackend(FakeBackend);

    #[async_trait::async_trait]
    impl codeplan::backend::PipelineBackend for SlowBackend {
        async fn analyze_feature(&self, description: &str) -> Result<String, ApiError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            self.0.analyze_feature(description).await
        }
        async fn save_annotations(&self, a: &AnnotationMap) -> Result<(), ApiError> {
            self.0.save_annotations(a).await
        }
        async fn select_files(
            &self,
            plan: &str,
            a: &AnnotationMap,
        ) -> Result<codeplan::backend::SelectionResponse, ApiError> {
            self.0.select_files(plan, a).await
        }
        async fn generate_changes(
            &self,
            f: &codeplan::types::OriginalFilesMap,
            s: &SelectionMap,
            a: &AnnotationMap,
            plan: &str,
        ) -> Result<ChangedFilesMap, ApiError> {
            self.0.generate_changes(f, s, a, plan).await
        }
        async fn fetch_precomputed_annotations(&self) -> Result<AnnotationMap, ApiError> {
            self.0.fetch_precomputed_annotations().await
        }
        async fn fetch_precomputed_selection(&self) -> Result<SelectionMap, ApiError> {
            self.0.fetch_precomputed_selection().await
        }
    }

    let progress = Arc::new(RecordingProgress::default());
    let mut session = PipelineSession::new(
        Arc::new(FakeProvider::default()),
        Arc::new(SlowBackend(FakeBackend::default())),
        IngestConfig::default(),
    )
    .unwrap()
    .with_progress(progress.clone());

    let feature = FeatureDescription::merge("add printing", None).unwrap();
    session.analyze_feature(&feature).await.unwrap();

    let values = progress.values(Stage::Analysis);
    assert_non_decreasing(&values);
    assert_eq!(values.first(), Some(&0));
    assert_eq!(values.last(), Some(&100));
    let simulated: Vec<u8> = values[1..values.len() - 1].to_vec();
    assert!(!simulated.is_empty());
    assert!(simulated.iter().all(|v| *v > 0 && *v <= 90));
}

#[tokio::test(start_paused = true)]
async fn generation_extracts_code_into_originals() {
    let backend = Arc::new(FakeBackend {
        changes: Ok(ChangedFilesMap::from([(
            "proj/a.py".to_string(),
            "explanation\n```python\nprint(1)\n```".to_string(),
        )])),
        ..FakeBackend::default()
    });
    let progress = Arc::new(RecordingProgress::default());
    let mut session = session(FakeProvider::default(), backend.clone(), progress.clone());

    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();
    session.select().await.unwrap();
    let changed = session.generate().await.unwrap().clone();

    assert_eq!(changed.keys().collect::<Vec<_>>(), vec!["proj/a.py"]);
    assert_eq!(session.diff().originals()["proj/a.py"], "print(1)");
    assert_eq!(session.diff().originals()["proj/c.py"], "c = 1");

    let baseline = session.diff().baseline_diff("proj/a.py").unwrap();
    assert_eq!(baseline.original, "print(0)");
    assert_eq!(baseline.changed, "print(1)");

    let record = session.diff_for("proj/a.py").unwrap().clone();
    assert_eq!(record.file_name, "a.py");
    assert_eq!(record.changed, "print(1)");
    assert_eq!(record.changed_label(), "a(change).py");
    assert_eq!(session.diff().active(), Some(&record));

    let requests = backend.generate_requests.lock();
    assert_eq!(requests.len(), 1);
    let (files, selection, plan) = &requests[0];
    assert_eq!(files.len(), 3);
    assert_eq!(files["proj/a.py"], "print(0)");
    assert_eq!(selection.keys().collect::<Vec<_>>(), vec!["proj/a.py"]);
    assert_eq!(plan, "1. Change a.py");

    assert_eq!(progress.values(Stage::Generation).last(), Some(&100));
}

#[tokio::test(start_paused = true)]
async fn generation_maps_bare_file_names_to_full_paths() {
    let backend = Arc::new(FakeBackend {
        changes: Ok(ChangedFilesMap::from([
            ("b.py".to_string(), "```python\nb = 2\n```".to_string()),
            ("missing.py".to_string(), "```python\nm = 0\n```".to_string()),
        ])),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );

    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change b.py")).unwrap();
    session.select().await.unwrap();
    let changed = session.generate().await.unwrap();

    assert!(changed.contains_key("proj/sub/b.py"));
    assert!(changed.contains_key("missing.py"));
    assert!(!changed.contains_key("b.py"));
    assert_eq!(session.diff_for("proj/sub/b.py").unwrap().changed, "b = 2");
    assert!(matches!(session.diff_for("proj/c.py"), Err(ApiError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn failed_generation_yields_no_changes() {
    let backend = Arc::new(FakeBackend {
        changes: Err("missing changed_files".to_string()),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );

    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();
    session.select().await.unwrap();

    assert!(session.generate().await.unwrap().is_empty());
    assert_eq!(session.diff().originals()["proj/a.py"], "print(0)");
}

#[tokio::test]
async fn precomputed_artifacts_replace_both_stores() {
    let annotations = AnnotationMap::from([("proj/a.py".to_string(), "prints".to_string())]);
    let selection = SelectionMap::from([("proj/a.py".to_string(), "entry point".to_string())]);
    let backend = Arc::new(FakeBackend {
        precomputed: Some((annotations.clone(), selection.clone())),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );

    session.load_precomputed().await.unwrap();
    assert_eq!(session.annotations(), Some(&annotations));
    assert_eq!(session.selection(), Some(&selection));
}

#[tokio::test]
async fn precomputed_failure_replaces_nothing() {
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        Arc::new(RecordingProgress::default()),
    );
    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();

    assert!(session.load_precomputed().await.is_err());
    assert_eq!(session.annotations().map(|a| a.len()), Some(3));
    assert!(session.selection().is_none());
}

#[tokio::test(start_paused = true)]
async fn precomputed_selection_survives_plan_and_drives_generation() {
    let annotations = AnnotationMap::from([("proj/a.py".to_string(), "prints".to_string())]);
    let selection = SelectionMap::from([("proj/a.py".to_string(), "entry point".to_string())]);
    let backend = Arc::new(FakeBackend {
        precomputed: Some((annotations, selection.clone())),
        changes: Ok(ChangedFilesMap::from([(
            "proj/a.py".to_string(),
            "```python\nprint(2)\n```".to_string(),
        )])),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend.clone(),
        Arc::new(RecordingProgress::default()),
    );

    session.ingest(project()).unwrap();
    session.load_precomputed().await.unwrap();
    session.set_plan(ChangePlan::new("1. Change a.py")).unwrap();
    assert_eq!(session.selection(), Some(&selection));

    let changed = session.generate().await.unwrap();
    assert!(changed.contains_key("proj/a.py"));
    assert_eq!(session.diff().originals()["proj/a.py"], "print(2)");
    assert_eq!(*backend.select_calls.lock(), 0);
    assert_eq!(backend.generate_requests.lock()[0].1, selection);
}

#[tokio::test(start_paused = true)]
async fn precomputed_selection_survives_feature_analysis() {
    let selection = SelectionMap::from([("proj/c.py".to_string(), "helper".to_string())]);
    let backend = Arc::new(FakeBackend {
        precomputed: Some((AnnotationMap::new(), selection.clone())),
        ..FakeBackend::default()
    });
    let mut session = session(
        FakeProvider::default(),
        backend,
        Arc::new(RecordingProgress::default()),
    );

    session.ingest(project()).unwrap();
    session.load_precomputed().await.unwrap();
    let feature = FeatureDescription::merge("add printing", None).unwrap();
    assert!(session.analyze_feature(&feature).await.unwrap().is_some());
    assert_eq!(session.selection(), Some(&selection));

    // Re-annotating replaces the precomputed pair, so a new plan clears it again.
    session.annotate().await.unwrap();
    assert!(session.selection().is_none());
}

#[test]
fn toggling_directories_flips_their_state() {
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        Arc::new(RecordingProgress::default()),
    );
    assert!(matches!(
        session.toggle_expanded("proj"),
        Err(ApiError::Precondition(_))
    ));

    session.ingest(project()).unwrap();
    assert_eq!(session.toggle_expanded("proj").unwrap(), true);
    assert_eq!(session.toggle_expanded("proj/sub").unwrap(), true);
    assert_eq!(session.toggle_expanded("proj/sub").unwrap(), false);
    assert!(matches!(
        session.toggle_expanded("proj/a.py"),
        Err(ApiError::NotFound(_))
    ));
    assert!(matches!(
        session.toggle_expanded("other"),
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn reingesting_clears_downstream_stores() {
    let mut session = session(
        FakeProvider::default(),
        Arc::new(FakeBackend::default()),
        Arc::new(RecordingProgress::default()),
    );
    session.ingest(project()).unwrap();
    session.annotate().await.unwrap();
    session.set_plan(ChangePlan::new("plan")).unwrap();

    session
        .ingest(vec![FileHandle::in_memory("other/z.py", "z")])
        .unwrap();
    assert!(session.annotations().is_none());
    assert!(session.selection().is_none());
    assert_eq!(session.plan(), Some(&ChangePlan::new("plan")));
    assert_eq!(session.directory().map(|d| d.name.as_str()), Some("other"));
}
