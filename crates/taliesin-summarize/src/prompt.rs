//! Prompt templates and tagged-output extraction.
//!
//! Map and combine prompts are plain strings with a `{text}` placeholder
//! that receives the corpus (or a chunk of it) at render time. Additional
//! named placeholders can be bound up front, so one template can be
//! specialized per topic before the engine ever sees it.

use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Templates
// ─────────────────────────────────────────────────────────────────────────────

/// Map-stage template for summarizing retrieved source documents.
pub const SOURCE_MAP_TEMPLATE: &str = "\
The content between the <context> tags contains documents retrieved from an \
external data source.

Write a meaningful summary of the content, grouping related items together \
where possible. Wrap the summary in <summary> tags.

<context>{text}</context>

Rely only on the information between the context tags. If nothing in the \
context is relevant, say so.
CONCISE SUMMARY:";

/// Combine-stage template merging map-stage summaries into one.
pub const SOURCE_COMBINE_TEMPLATE: &str = "\
The content between the <context> tags contains summaries of retrieved \
documents, each produced independently.

Write one concise summary of the topics across these summaries, grouping \
related items together where possible. Wrap the summary in <summary> tags.

<context>{text}</context>

Rely only on the information between the context tags. If nothing in the \
context is relevant, say so.
CONCISE SUMMARY:";

// ─────────────────────────────────────────────────────────────────────────────
// Prompt Template
// ─────────────────────────────────────────────────────────────────────────────

/// A prompt with a `{text}` placeholder and optional named placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template from a raw string.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Substitute a named placeholder (`{name}`) ahead of rendering.
    pub fn bind(mut self, name: &str, value: &str) -> Self {
        self.template = self.template.replace(&format!("{{{name}}}"), value);
        self
    }

    /// Render the template with `text` substituted for `{text}`.
    pub fn render(&self, text: &str) -> String {
        self.template.replace("{text}", text)
    }

    /// The raw template string.
    pub fn template(&self) -> &str {
        &self.template
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tag Extraction
// ─────────────────────────────────────────────────────────────────────────────

/// Extract `<tag>…</tag>` sections from model output into a map.
///
/// Tag names are ASCII word characters. Content is trimmed. When the same
/// tag appears more than once, the last occurrence wins. Unclosed tags are
/// ignored.
pub fn extract_tags(text: &str) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    let mut i = 0;

    while let Some(open) = text[i..].find('<') {
        let start = i + open;
        let rest = &text[start + 1..];

        let name_len = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .count();
        if name_len == 0 || !rest[name_len..].starts_with('>') {
            i = start + 1;
            continue;
        }

        let name = &rest[..name_len];
        let content_start = start + 1 + name_len + 1;
        let close = format!("</{name}>");
        match text[content_start..].find(&close) {
            Some(offset) => {
                let content = text[content_start..content_start + offset].trim();
                tags.insert(name.to_string(), content.to_string());
                i = content_start + offset + close.len();
            }
            None => {
                i = start + 1;
            }
        }
    }

    tags
}

/// Extract a single named tag's content, if present.
pub fn extract_tag(text: &str, name: &str) -> Option<String> {
    extract_tags(text).remove(name)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
