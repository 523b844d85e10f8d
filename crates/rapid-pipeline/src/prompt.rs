//! Prompt composition: instruction + optional template + extracted content

use serde::Serialize;

use crate::config::PromptConfig;
use crate::folder::truncate_with_marker;

/// What the prompt's content section holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptContent {
    /// Text extracted from a single file
    SingleFile,
    /// A corpus merged from multiple files
    Combined,
}

/// A composed prompt, bounded by the configured ceiling
#[derive(Debug, Clone, Serialize)]
pub struct ComposedPrompt {
    /// Final prompt text sent to the AI service
    pub text: String,
    /// Whether the ceiling forced truncation
    pub truncated: bool,
}

impl ComposedPrompt {
    pub fn total_length(&self) -> usize {
        self.text.chars().count()
    }
}

/// Composes the final prompt sent to the AI service.
///
/// Applies its own length ceiling independently of the combine-step ceiling:
/// folder mode and template mode can stack content, so the two limits guard
/// different stages.
pub struct PromptCompositor {
    config: PromptConfig,
}

impl PromptCompositor {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// Merge instruction, optional template, and content into one prompt.
    ///
    /// A supplied template is prefixed as an explicit instruction ahead of
    /// the user's own, so the model treats it as the output shape to fill.
    pub fn compose(
        &self,
        instruction: &str,
        template: Option<&str>,
        content: &str,
        content_kind: PromptContent,
    ) -> ComposedPrompt {
        let mut prompt = String::new();

        if let Some(template_text) = template {
            prompt.push_str(&format!("Use this template: {}. ", template_text));
        }

        prompt.push_str(instruction);

        if !content.is_empty() {
            match content_kind {
                PromptContent::Combined => {
                    prompt.push_str("\n\nProcess this combined content from multiple files:\n");
                }
                PromptContent::SingleFile => {
                    prompt.push_str("\n\nProcess this file content:\n");
                }
            }
            prompt.push_str(content);
        }

        let truncated = prompt.chars().count() > self.config.max_chars;
        let text = truncate_with_marker(&prompt, self.config.max_chars);

        ComposedPrompt { text, truncated }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folder::TRUNCATION_MARKER;

    fn compositor() -> PromptCompositor {
        PromptCompositor::new(PromptConfig::default())
    }

    #[test]
    fn template_prefixes_instruction() {
        let prompt = compositor().compose(
            "Summarize",
            Some("| Name | Date |"),
            "content here",
            PromptContent::SingleFile,
        );
        assert!(prompt.text.starts_with("Use this template: | Name | Date |. Summarize"));
        assert!(!prompt.truncated);
    }

    #[test]
    fn combined_content_gets_multi_file_framing() {
        let prompt = compositor().compose(
            "Summarize",
            None,
            "Hello world",
            PromptContent::Combined,
        );
        assert_eq!(
            prompt.text,
            "Summarize\n\nProcess this combined content from multiple files:\nHello world"
        );
    }

    #[test]
    fn ceiling_applies_after_template_stacking() {
        let compositor = PromptCompositor::new(PromptConfig { max_chars: 200 });
        let prompt = compositor.compose(
            "Summarize",
            Some(&"t".repeat(150)),
            &"c".repeat(150),
            PromptContent::Combined,
        );
        assert_eq!(prompt.total_length(), 200);
        assert!(prompt.truncated);
        assert!(prompt.text.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn empty_content_leaves_instruction_alone() {
        let prompt = compositor().compose("Just answer", None, "", PromptContent::SingleFile);
        assert_eq!(prompt.text, "Just answer");
    }
}
