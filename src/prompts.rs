//! Centralized prompt definitions
//!
//! Every instruction sent to the completion endpoint lives here so the wording
//! can be reviewed and tested in one place.

use crate::bookmark::Bookmark;

/// System instructions for the chat assistant.
pub const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful assistant that can manage bookmarks.

A bookmark is represented as:
Title: 'My Bookmark'
Category: 'Category/Subcategory'
URL: 'https://example.com'
Summary: 'This is a summary of the bookmark.'";

/// Developer note appended after tools ran, before the confirming call.
pub const FOLLOW_UP_NOTE: &str =
    "If you need to perform follow-up actions, confirm with the user first.";

/// Preamble of the page summary prompt; the page content follows it.
pub const SUMMARY_PROMPT: &str = "Create a concise summary (1-2 sentences) of the following website content that would be perfect for a bookmark description. The summary should clearly convey what the page contains and why someone might find it valuable, without being too lengthy.";

/// Build the page summary prompt.
pub fn summary_prompt(title: &str, url: &str, content: &str) -> String {
    format!("{SUMMARY_PROMPT}\n\nTitle: {title}\nURL: {url}\n\n{content}")
}

/// Build the category prompt for a bookmark.
///
/// Existing categories are listed as hints; guidance is included only when
/// the user gave some.
pub fn category_prompt(
    bookmark: &Bookmark,
    existing_categories: &[String],
    guidance: Option<&str>,
) -> String {
    let mut prompt = String::new();

    if !existing_categories.is_empty() {
        prompt.push_str("Existing categories:\n");
        prompt.push_str(&existing_categories.join("\n"));
        prompt.push_str("\n\n");
    }

    let guidance = guidance.map(str::trim).filter(|g| !g.is_empty());
    if let Some(guidance) = guidance {
        prompt.push_str(&format!("User guidance: {guidance}\n\n"));
    }

    prompt.push_str(&format!(
        "Generate an appropriate category for this bookmark:\nTitle: {}\nURL: {}\nSummary: {}\n\n",
        bookmark.title, bookmark.url, bookmark.summary
    ));
    prompt.push_str(
        "The category should follow a hierarchical structure and be returned as an array of strings. \
         If it fits an existing category, use that. Otherwise, create a logical new category.",
    );
    if guidance.is_some() {
        prompt.push_str(" Incorporate user guidance into the category selection.");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark() -> Bookmark {
        Bookmark::new("https://example.com", "Example", "An example page").unwrap()
    }

    #[test]
    fn test_category_prompt_lists_existing_categories() {
        let prompt = category_prompt(
            &bookmark(),
            &["Tech".to_string(), "Tech/AI".to_string()],
            None,
        );
        assert!(prompt.starts_with("Existing categories:\nTech\nTech/AI\n\n"));
        assert!(prompt.contains("Title: Example\nURL: https://example.com\nSummary: An example page"));
        assert!(!prompt.contains("User guidance"));
    }

    #[test]
    fn test_category_prompt_without_categories_or_guidance() {
        let prompt = category_prompt(&bookmark(), &[], Some("   "));
        assert!(prompt.starts_with("Generate an appropriate category"));
        assert!(!prompt.contains("Incorporate user guidance"));
    }

    #[test]
    fn test_category_prompt_with_guidance() {
        let prompt = category_prompt(&bookmark(), &[], Some("put it under Reading"));
        assert!(prompt.starts_with("User guidance: put it under Reading\n\n"));
        assert!(prompt.ends_with("Incorporate user guidance into the category selection."));
    }

    #[test]
    fn test_summary_prompt_includes_page() {
        let prompt = summary_prompt("Example", "https://example.com", "Body text");
        assert!(prompt.starts_with(SUMMARY_PROMPT));
        assert!(prompt.ends_with("Body text"));
    }
}
