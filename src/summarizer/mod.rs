//! Short bookmark descriptions for fetched pages.

use std::sync::Arc;
use tracing::debug;

use crate::error::{CompletionError, CompletionResult};
use crate::fetcher::Page;
use crate::llm::{CompletionClient, CompletionRequest};
use crate::prompts::summary_prompt;

/// Character budget for page text included in the prompt.
pub const MAX_CONTENT_CHARS: usize = 12_000;

/// Summarizes pages through the completion endpoint.
#[derive(Clone)]
pub struct PageSummarizer {
    client: Arc<dyn CompletionClient>,
}

impl PageSummarizer {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// One-to-two sentence description of `page`.
    pub async fn summarize(&self, page: &Page) -> CompletionResult<String> {
        let content = truncate_chars(&page.text, MAX_CONTENT_CHARS);
        let request = CompletionRequest::prompt(summary_prompt(&page.title, &page.url, content));

        let summary = self.client.complete(request).await?.output_text();
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(CompletionError::InvalidResponse {
                message: "Empty summary".to_string(),
            });
        }

        debug!(url = %page.url, summary_len = summary.len(), "Page summarized");
        Ok(summary.to_string())
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
