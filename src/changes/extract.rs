//! Fenced code extraction
//!
//! Generated text mixes prose and fenced code. The code of interest is the
//! last block tagged with the configured language; text without a usable
//! block is returned whole.

use crate::error::ApiError;
use regex::Regex;

/// Extracts the last fenced block for one language tag
#[derive(Debug, Clone)]
pub struct CodeExtractor {
    pattern: Regex,
}

impl CodeExtractor {
    pub fn new(language: &str) -> Result<Self, ApiError> {
        let pattern = format!(r"(?is)```{}\s*\n(.*?)```", regex::escape(language));
        let pattern = Regex::new(&pattern)
            .map_err(|e| ApiError::ConfigError(format!("Invalid fence pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Trimmed content of the last block, or the whole text trimmed when there
    /// is no block or the last block is blank. Idempotent.
    pub fn extract(&self, text: &str) -> String {
        let last = self
            .pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .last()
            .map(|m| m.as_str().trim());
        match last {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => text.trim().to_string(),
        }
    }
}

/// One-shot form of [`CodeExtractor::extract`].
pub fn extract_code(text: &str, language: &str) -> String {
    match CodeExtractor::new(language) {
        Ok(extractor) => extractor.extract(text),
        Err(_) => text.trim().to_string(),
    }
}
