//! Properties of fenced code extraction.

use codeplan::changes::{extract_code, CodeExtractor};
use proptest::prelude::*;

fn code_line() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_ =()+]{0,20}"
}

/// One piece of generated text: prose, a fence opener, a code body or a
/// closer. Openers and closers may be unbalanced.
fn fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[A-Za-z ,.]{0,30}\n",
        2 => prop_oneof![
            Just("```python\n".to_string()),
            Just("```Python  \n".to_string()),
            Just("```rust\n".to_string()),
        ],
        3 => prop_oneof![
            code_line().prop_map(|line| format!("{}\n", line)),
            Just("   \n".to_string()),
        ],
        2 => Just("```\n".to_string()),
    ]
}

fn generated_text() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..12).prop_map(|parts| parts.concat())
}

proptest! {
    #[test]
    fn extraction_is_idempotent(text in generated_text()) {
        let once = extract_code(&text, "python");
        prop_assert_eq!(extract_code(&once, "python"), once.clone());
    }

    #[test]
    fn extracted_block_never_contains_a_fence(
        body in code_line(),
        tail in generated_text(),
    ) {
        let text = format!("```python\n{}\n```\n{}", body, tail);
        let code = extract_code(&text, "python");
        if code != text.trim() {
            prop_assert!(!code.contains("```"));
        }
    }

    #[test]
    fn last_fenced_block_wins(
        first in code_line(),
        last in code_line(),
        prose in "[A-Za-z ,.]{0,40}",
    ) {
        let text = format!(
            "{prose}\n```python\n{first}\n```\nthen\n```python\n{last}\n```\n{prose}"
        );
        prop_assert_eq!(extract_code(&text, "python"), last.trim().to_string());
    }

    #[test]
    fn text_without_fence_is_trimmed(text in "[A-Za-z0-9 \n]{0,80}") {
        prop_assert_eq!(extract_code(&text, "python"), text.trim().to_string());
    }
}

#[test]
fn blank_last_block_after_code_falls_back_to_full_text() {
    let text = "```python\nx = 1\n```\n```Python\n   \n```";
    assert_eq!(extract_code(text, "python"), text);
    assert_eq!(extract_code(&extract_code(text, "python"), "python"), text);
}

#[test]
fn fence_of_another_language_is_not_extracted() {
    let text = "```rust\nfn main() {}\n```";
    assert_eq!(extract_code(text, "python"), text);
}

#[test]
fn empty_fenced_block_falls_back_to_full_text() {
    let text = "nothing here\n```python\n\n```";
    assert_eq!(extract_code(text, "python"), text);
}

#[test]
fn extractor_matches_fence_tag_case_insensitively() {
    let extractor = CodeExtractor::new("python").unwrap();
    assert_eq!(extractor.extract("```Python\nx = 1\n```"), "x = 1");
}
