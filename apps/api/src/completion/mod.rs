//! Completion backends — the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: the pipeline engine never talks to a vendor API
//! directly. Stages hold an `Arc<dyn Completion>` and know nothing about
//! what sits behind it, which is also what makes the engine testable with
//! a stub backend.

pub mod gemini;
pub mod openai;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub(crate) const MAX_RETRIES: u32 = 3;
pub(crate) const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("backend returned empty content")]
    EmptyContent,
}

/// One unit of text generation: a role description (system prompt) plus a
/// fully rendered task prompt. Backends receive exactly this and return
/// plain text.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
}

/// Opaque text-generation capability. One method per adapter; anything the
/// backend does internally (transport retries, token accounting) stays
/// behind it.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// The backend bindings built once at startup and shared by all runs.
/// Extraction, analysis, and rewriting go to OpenAI; the judgement-flavored
/// stages go to Gemini.
#[derive(Clone)]
pub struct Backends {
    pub openai: Arc<dyn Completion>,
    pub gemini: Arc<dyn Completion>,
}

/// Strips ```json / ```markdown / bare ``` code fences from model output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the language tag on the opening fence line, if any.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest.trim_start(),
    };
    rest.strip_suffix("```")
        .map(str::trim)
        .unwrap_or_else(|| rest.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_with_markdown_tag() {
        let input = "```markdown\n# Jane Doe\n\nEngineer\n```";
        assert_eq!(strip_code_fences(input), "# Jane Doe\n\nEngineer");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_code_fences_unterminated() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_code_fences(input), "{\"key\": \"value\"}");
    }
}
