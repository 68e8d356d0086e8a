//! Hosted generative model access.
//!
//! Every stage that talks to a model goes through [`LanguageModel`], so
//! describing, selecting and rewriting files can run against the real
//! [`GeminiClient`] or a test double.

mod gemini;

pub use gemini::GeminiClient;

use crate::error::Result;
use async_trait::async_trait;

/// A text-in, text-out generative model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Send one prompt and return the model's text reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Cut `content` to at most `max_chars` characters, marking the cut.
#[must_use]
pub fn truncate_content(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}... (truncated)", &content[..byte_idx]),
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("abc", 10), "abc");
        assert_eq!(truncate_content("abc", 3), "abc");
        assert_eq!(truncate_content("abcdef", 3), "abc... (truncated)");
        assert_eq!(truncate_content("ééé", 2), "éé... (truncated)");
    }
}
