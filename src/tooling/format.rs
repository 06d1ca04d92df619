//! Text formatting for CLI output: tree, annotation, selection and change tables.

use crate::diff::{DiffReconciler, DiffRecord};
use crate::provider::profile::ValidationResult;
use crate::tree::walker::join_path;
use crate::tree::{Directory, DirectoryNode, TreeNode};
use crate::types::{AnnotationMap, ChangedFilesMap, SelectionMap, ANNOTATION_SENTINEL};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{ContentArrangement, Table};
use owo_colors::OwoColorize;

const SUMMARY_WIDTH: usize = 96;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Single-line summary of a possibly long text.
pub fn truncate_for_summary(text: &str, width: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= width {
        return line;
    }
    let cut: String = line.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Indented tree listing. Files with a generated change are highlighted.
pub fn format_tree_text(directory: &Directory, changes: Option<&DiffReconciler>) -> String {
    let mut out = format!("{}/\n", directory.name.bold());
    render_children(&directory.root, &directory.name, 1, changes, &mut out);
    out
}

fn render_children(
    dir: &DirectoryNode,
    path: &str,
    depth: usize,
    changes: Option<&DiffReconciler>,
    out: &mut String,
) {
    let indent = "  ".repeat(depth);
    for (name, child) in &dir.children {
        let child_path = join_path(path, name);
        match child {
            TreeNode::Directory(sub) => {
                let marker = if sub.expanded { "-" } else { "+" };
                out.push_str(&format!("{}{} {}/\n", indent, marker, name.blue()));
                render_children(sub, &child_path, depth + 1, changes, out);
            }
            TreeNode::File(_) => {
                if changes.is_some_and(|c| c.is_changed(&child_path)) {
                    out.push_str(&format!("{}  {} {}\n", indent, name.green(), "(changed)".green()));
                } else {
                    out.push_str(&format!("{}  {}\n", indent, name));
                }
            }
        }
    }
}

pub fn format_annotations_table(annotations: &AnnotationMap) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Path", "Annotation"]);
    for (path, text) in annotations {
        let summary = if text == ANNOTATION_SENTINEL {
            format!("{}", text.red())
        } else {
            truncate_for_summary(text, SUMMARY_WIDTH)
        };
        table.add_row(vec![path.clone(), summary]);
    }
    let failed = annotations
        .values()
        .filter(|t| t.as_str() == ANNOTATION_SENTINEL)
        .count();
    format!(
        "{}\n{} files annotated, {} failed",
        table,
        annotations.len(),
        failed
    )
}

pub fn format_selection_table(selection: &SelectionMap) -> String {
    if selection.is_empty() {
        return "No files selected".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Selected path", "Rationale"]);
    for (path, rationale) in selection {
        table.add_row(vec![path.clone(), truncate_for_summary(rationale, SUMMARY_WIDTH)]);
    }
    table.to_string()
}

pub fn format_changes_table(changed: &ChangedFilesMap, diff: &DiffReconciler) -> String {
    if changed.is_empty() {
        return "No changes generated".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Changed path", "Original lines", "New lines"]);
    for path in changed.keys() {
        let (before, after) = match diff.baseline_diff(path) {
            Ok(record) => (
                record.original.lines().count().to_string(),
                record.changed.lines().count().to_string(),
            ),
            Err(_) => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![path.clone(), before, after]);
    }
    table.to_string()
}

/// Both sides of a diff record, one after the other.
pub fn format_diff_record(record: &DiffRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", format!("--- {}", record.file_name).red()));
    out.push_str(&record.original);
    if !record.original.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("{}\n", format!("+++ {}", record.changed_label()).green()));
    out.push_str(&record.changed);
    if !record.changed.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Format a configuration validation result
pub fn format_validation_result(title: &str, result: &ValidationResult) -> String {
    let mut output = format!("{}\n\n", format_section_heading(title));
    for (description, passed) in &result.checks {
        if *passed {
            output.push_str(&format!(" {} {}\n", "ok".green(), description));
        } else {
            output.push_str(&format!(" {} {}\n", "FAIL".red(), description));
        }
    }
    if !result.errors.is_empty() {
        output.push_str("\nErrors:\n");
        for error in &result.errors {
            output.push_str(&format!(" {}\n", error));
        }
    }
    if !result.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &result.warnings {
            output.push_str(&format!(" {}\n", warning.yellow()));
        }
    }
    output.push_str(&format!(
        "\nValidation {}: {}/{} checks passed, {} errors found\n",
        if result.is_valid() { "passed" } else { "failed" },
        result.passed_checks(),
        result.total_checks(),
        result.errors.len()
    ));
    output
}
