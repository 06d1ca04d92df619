//! CLI Tooling
//!
//! Command-line interface over the pipeline session. Each command loads the
//! layered configuration for the workspace, runs the stages it needs and
//! returns its output as text.

use super::format::{
    format_annotations_table, format_changes_table, format_diff_record, format_section_heading,
    format_selection_table, format_tree_text, format_validation_result,
};
use crate::config::{sources::workspace_file, xdg, CodeplanConfig, ConfigLoader};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::pipeline::PipelineSession;
use crate::progress::{ProgressSink, Stage};
use crate::provider::diagnostics::ProviderDiagnosticsService;
use crate::provider::profile::ValidationResult;
use crate::types::{ChangePlan, FeatureDescription};
use clap::{Parser, Subcommand};
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Codeplan CLI - plan-driven code changes for a source tree
#[derive(Parser)]
#[command(name = "codeplan")]
#[command(about = "Annotate a source tree, select files for a change plan, and generate changes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where codeplan.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply logging flags on top of the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

/// Feature description sources shared by `plan` and `run`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FeatureArgs {
    /// Feature description text
    #[arg(long)]
    pub feature: Option<String>,

    /// File whose content is appended to the feature description
    #[arg(long)]
    pub feature_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a directory and print its tree
    Tree {
        /// Source directory
        dir: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Annotate every file of a directory
    Annotate {
        /// Source directory
        dir: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Turn a feature description into a change plan
    Plan {
        #[command(flatten)]
        feature: FeatureArgs,
    },
    /// Run the full pipeline: annotate, plan, select, generate
    Run {
        /// Source directory
        dir: PathBuf,
        #[command(flatten)]
        feature: FeatureArgs,
        /// Use a change plan from a file instead of plan analysis
        #[arg(long)]
        plan_file: Option<PathBuf>,
        /// Use the backend's precomputed annotations and selection
        #[arg(long)]
        precomputed: bool,
        /// Generate without asking for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
        /// Print both sides of every generated change
        #[arg(long)]
        diff: bool,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default configuration as TOML
    Init {
        /// Write the global config instead of the workspace file
        #[arg(long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration
    Show,
    /// Validate the effective configuration
    Check,
}

/// Progress sink that redraws one status line on stderr
pub struct ConsoleProgress {
    interactive: bool,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            interactive: std::io::stderr().is_terminal(),
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleProgress {
    fn report(&self, stage: Stage, percent: u8) {
        if !self.interactive {
            return;
        }
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{:<11} {:>3}%", stage.to_string(), percent);
        if percent == 100 {
            let _ = writeln!(stderr);
        }
        let _ = stderr.flush();
    }
}

/// Loaded configuration plus the paths it came from
pub struct CliContext {
    workspace_root: PathBuf,
    config: CodeplanConfig,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &CodeplanConfig {
        &self.config
    }

    fn session(&self) -> Result<PipelineSession, ApiError> {
        Ok(PipelineSession::from_config(&self.config)?
            .with_progress(Arc::new(ConsoleProgress::new())))
    }

    /// Execute a command and return its output.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        let start = Instant::now();
        let result = match command {
            Commands::Tree { dir, format } => self.handle_tree(dir, format),
            Commands::Annotate { dir, format } => self.handle_annotate(dir, format).await,
            Commands::Plan { feature } => self.handle_plan(feature).await,
            Commands::Run {
                dir,
                feature,
                plan_file,
                precomputed,
                yes,
                diff,
            } => {
                self.handle_run(dir, feature, plan_file.as_deref(), *precomputed, *yes, *diff)
                    .await
            }
            Commands::Config { command } => self.handle_config(command),
        };
        info!(
            ok = result.is_ok(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Command finished"
        );
        result
    }

    fn handle_tree(&self, dir: &Path, format: &str) -> Result<String, ApiError> {
        let handles = crate::ingest::scan_directory(dir, &self.config.ingest.extensions)?;
        let directory = crate::tree::TreeBuilder::build(handles)
            .ok_or_else(|| ApiError::Precondition("no visible files to ingest".to_string()))?;
        if format == "json" {
            let paths: Vec<String> = directory.files().map(|(_, path)| path).collect();
            return Ok(serde_json::to_string_pretty(&serde_json::json!({
                "root": directory.name,
                "files": paths,
            }))?);
        }
        Ok(format!(
            "{}\n{} files",
            format_tree_text(&directory, None),
            directory.file_count()
        ))
    }

    async fn handle_annotate(&self, dir: &Path, format: &str) -> Result<String, ApiError> {
        let mut session = self.session()?;
        session.ingest_dir(dir)?;
        let annotations = session.annotate().await?;
        if format == "json" {
            return Ok(serde_json::to_string_pretty(annotations)?);
        }
        Ok(format_annotations_table(annotations))
    }

    async fn handle_plan(&self, feature: &FeatureArgs) -> Result<String, ApiError> {
        let description = read_feature(feature)?;
        let mut session = self.session()?;
        match session.analyze_feature(&description).await? {
            Some(plan) => Ok(plan.to_string()),
            None => Err(ApiError::ProviderError(
                "plan analysis is unavailable".to_string(),
            )),
        }
    }

    async fn handle_run(
        &self,
        dir: &Path,
        feature: &FeatureArgs,
        plan_file: Option<&Path>,
        precomputed: bool,
        yes: bool,
        show_diff: bool,
    ) -> Result<String, ApiError> {
        let mut session = self.session()?;
        let mut output = String::new();

        let file_count = session.ingest_dir(dir)?.file_count();
        output.push_str(&format!("Ingested {} files\n\n", file_count));

        if precomputed {
            session.load_precomputed().await?;
        } else {
            let annotations = session.annotate().await?;
            output.push_str(&format!(
                "{}\n{}\n\n",
                format_section_heading("Annotations"),
                format_annotations_table(annotations)
            ));
        }

        match plan_file {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                session.set_plan(ChangePlan::new(text))?;
            }
            None => {
                let description = read_feature(feature)?;
                if session.analyze_feature(&description).await?.is_none() {
                    return Err(ApiError::ProviderError(
                        "plan analysis is unavailable".to_string(),
                    ));
                }
            }
        }
        if let Some(plan) = session.plan() {
            output.push_str(&format!(
                "{}\n{}\n\n",
                format_section_heading("Change plan"),
                plan
            ));
        }

        if !precomputed && session.select().await?.is_none() {
            return Err(ApiError::ProviderError(
                "file selection is unavailable".to_string(),
            ));
        }
        let selection = session
            .selection()
            .ok_or_else(|| ApiError::Precondition("no file selection".to_string()))?;
        output.push_str(&format!(
            "{}\n{}\n\n",
            format_section_heading("Selection"),
            format_selection_table(selection)
        ));

        if !yes {
            // The summary so far is printed before the prompt.
            if !confirm_generation(&output, selection.len())? {
                return Ok("Generation cancelled".to_string());
            }
            output.clear();
        }

        let changed = session.generate().await?.clone();
        output.push_str(&format!(
            "{}\n{}\n",
            format_section_heading("Changes"),
            format_changes_table(&changed, session.diff())
        ));
        if let Some(directory) = session.directory() {
            output.push_str(&format!("\n{}", format_tree_text(directory, Some(session.diff()))));
        }
        if show_diff {
            for path in changed.keys() {
                let record = session.diff().baseline_diff(path)?;
                output.push_str(&format!("\n{}", format_diff_record(&record)));
            }
        }
        Ok(output)
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Init { global, force } => {
                let path = if *global {
                    xdg::global_config_path()?
                } else {
                    workspace_file::path_in(&self.workspace_root)
                };
                if path.exists() && !force {
                    return Err(ApiError::Precondition(format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    )));
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, CodeplanConfig::default().to_toml()?)?;
                Ok(format!("Wrote default configuration to {}", path.display()))
            }
            ConfigCommands::Show => self.config.to_toml(),
            ConfigCommands::Check => {
                let mut result = ProviderDiagnosticsService::validate(&self.config.provider);
                add_result(
                    &mut result,
                    "backend configuration is well-formed",
                    self.config.backend.validate(),
                );
                add_result(
                    &mut result,
                    "ingest configuration is well-formed",
                    self.config.ingest.validate(),
                );
                let mut output = format_validation_result("Configuration", &result);
                output.push_str(&format!(
                    "API key: {}\n",
                    ProviderDiagnosticsService::resolve_api_key_status(&self.config.provider)
                ));
                if result.is_valid() {
                    Ok(output)
                } else {
                    Err(ApiError::ConfigError(output))
                }
            }
        }
    }
}

fn add_result(result: &mut ValidationResult, description: &str, outcome: Result<(), String>) {
    match outcome {
        Ok(()) => result.add_check(description, true),
        Err(e) => {
            result.add_check(description, false);
            result.add_error(e);
        }
    }
}

fn read_feature(args: &FeatureArgs) -> Result<FeatureDescription, ApiError> {
    let file_text = match &args.feature_file {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    FeatureDescription::merge(args.feature.as_deref().unwrap_or_default(), file_text.as_deref())
        .ok_or_else(|| {
            ApiError::Precondition(
                "a feature description is required (--feature or --feature-file)".to_string(),
            )
        })
}

fn confirm_generation(summary: &str, selected: usize) -> Result<bool, ApiError> {
    use dialoguer::Confirm;
    print!("{}", summary);
    std::io::stdout().flush()?;
    Confirm::new()
        .with_prompt(format!("Generate changes for {} selected files?", selected))
        .default(true)
        .interact()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))
}
