//! Instruction formats applied to prompts before they reach the model.

use serde::{Deserialize, Serialize};

/// How a prompt is wrapped for the target model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PromptFormat {
    /// Sent unchanged
    Raw,
    /// DeepSeek-R1 chat markers with an opened reasoning block
    #[default]
    DeepseekR1,
}

impl PromptFormat {
    pub fn wrap(self, prompt: &str) -> String {
        match self {
            PromptFormat::Raw => prompt.to_string(),
            PromptFormat::DeepseekR1 => format!(
                "<\u{ff5c}begin\u{2581}of\u{2581}sentence\u{ff5c}><\u{ff5c}User\u{ff5c}>{}<\u{ff5c}Assistant\u{ff5c}><think>",
                prompt
            ),
        }
    }
}
