//! Annotation prompt template and prompt-file loading.

use crate::error::ApiError;
use std::path::{Path, PathBuf};

/// Built-in annotation template
pub const DEFAULT_TEMPLATE: &str =
    "Generate a detailed string description/docstring for what this {language} code does.\nPath: {path}\n```\n{content}\n```";

/// Resolve a prompt file path: absolute, `~/`, `./` (current dir), or relative to `base_dir`.
pub fn resolve_prompt_path(path: &str, base_dir: &Path) -> Result<PathBuf, ApiError> {
    if path.starts_with('/') {
        return Ok(PathBuf::from(path));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        let home =
            std::env::var("HOME").map_err(|_| ApiError::ConfigError("HOME not set".to_string()))?;
        return Ok(PathBuf::from(home).join(rest));
    }
    if let Some(rest) = path.strip_prefix("./") {
        let current_dir = std::env::current_dir().map_err(|e| {
            ApiError::ConfigError(format!("Failed to get current directory: {}", e))
        })?;
        return Ok(current_dir.join(rest));
    }
    Ok(base_dir.join(path))
}

/// Template rendered once per file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPrompt {
    template: String,
    language: String,
}

impl AnnotationPrompt {
    pub fn new(template: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            language: language.into(),
        }
    }

    pub fn with_language(language: impl Into<String>) -> Self {
        Self::new(DEFAULT_TEMPLATE, language)
    }

    /// Load a template from a prompt file.
    ///
    /// The file must be non-empty and contain a `{content}` placeholder.
    pub fn from_file(
        path: &str,
        base_dir: &Path,
        language: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let resolved = resolve_prompt_path(path, base_dir)?;
        let template = std::fs::read_to_string(&resolved).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read prompt file {}: {}",
                resolved.display(),
                e
            ))
        })?;
        if template.trim().is_empty() {
            return Err(ApiError::ConfigError(format!(
                "Prompt file {} is empty",
                resolved.display()
            )));
        }
        if !template.contains("{content}") {
            return Err(ApiError::ConfigError(format!(
                "Prompt file {} has no {{content}} placeholder",
                resolved.display()
            )));
        }
        Ok(Self::new(template, language))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Fill the placeholders in one pass over the template. Substituted text
    /// is never scanned again, so braces in paths or file text stay literal.
    pub fn render(&self, path: &str, content: &str) -> String {
        let values = [
            ("{language}", self.language.as_str()),
            ("{path}", path),
            ("{content}", content),
        ];
        let mut out = String::with_capacity(self.template.len() + content.len() + path.len());
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match values.iter().find(|(key, _)| tail.starts_with(key)) {
                Some((key, value)) => {
                    out.push_str(value);
                    rest = &tail[key.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for AnnotationPrompt {
    fn default() -> Self {
        Self::with_language("python")
    }
}
