//! Request and response bodies of the backend service.

use crate::types::{AnnotationMap, ChangedFilesMap, OriginalFilesMap, SelectionMap};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct AnalyzeRequest<'a> {
    pub feature_description: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

#[derive(Debug, Serialize)]
pub struct SelectRequest<'a> {
    pub low_level_plan: &'a str,
    pub docstring_results: &'a AnnotationMap,
}

/// Reply of the selection endpoint
///
/// `top_r_docstrings` is only trusted when `status == "success"`.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub top_r_docstrings: Option<SelectionMap>,
}

impl SelectionResponse {
    pub const SUCCESS: &'static str = "success";

    pub fn into_selection(self) -> Option<SelectionMap> {
        if self.status == Self::SUCCESS {
            self.top_r_docstrings
        } else {
            None
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
    pub files: &'a OriginalFilesMap,
    #[serde(rename = "topR")]
    pub top_r: &'a SelectionMap,
    pub docstrings: &'a AnnotationMap,
    pub low_level_plan: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub changed_files: ChangedFilesMap,
}
