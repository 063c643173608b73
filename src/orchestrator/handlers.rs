use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::tools::{
    AddBookmarksArgs, CategoryPathArgs, DeleteBookmarksArgs, MoveBookmarkArgs, MoveCategoryArgs,
    SearchArgs, ToolInvocation,
};
use crate::bookmark::{replace_category_prefix, validate_url, Bookmark};
use crate::classifier::CategoryClassifier;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::fetcher::PageFetcher;
use crate::repository::BookmarkRepository;
use crate::summarizer::PageSummarizer;

/// Status of a dispatched tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Added,
    Exists,
    Deleted,
    NotFound,
    Moved,
    Found,
    Error,
}

/// JSON envelope returned to the model for every tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ToolOutcome {
    pub fn new(status: OutcomeStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            error_kind: None,
            payload: Map::new(),
        }
    }

    /// Envelope for a failed operation
    pub fn from_error(error: &AppError) -> Self {
        Self {
            status: OutcomeStatus::Error,
            message: format!("Error occurred: {}", error),
            error_kind: Some(error.kind()),
            payload: Map::new(),
        }
    }

    /// Attach a payload field
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.payload.insert(key.to_string(), value);
            }
            Err(e) => warn!(key = %key, error = %e, "Dropping unserializable payload field"),
        }
        self
    }

    /// Serialized envelope sent back as the function call output
    pub fn to_output(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                "{{\"status\":\"error\",\"message\":\"Failed to serialize tool result: {}\"}}",
                e
            )
        })
    }
}

/// Per-URL result inside add and delete envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStatus {
    Created,
    Exists,
    Deleted,
    NotFound,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlOutcome {
    pub url: String,
    pub outcome: UrlStatus,
    pub message: String,
}

impl UrlOutcome {
    fn new(url: &str, outcome: UrlStatus, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            outcome,
            message: message.into(),
        }
    }

    fn error(url: &str, error: &AppError) -> Self {
        Self::new(url, UrlStatus::Error, format!("Error occurred: {}", error))
    }
}

/// Overall status from per-URL results, by precedence.
fn aggregate(results: &[UrlOutcome], precedence: [(UrlStatus, OutcomeStatus); 2]) -> OutcomeStatus {
    precedence
        .into_iter()
        .find(|(url_status, _)| results.iter().any(|r| r.outcome == *url_status))
        .map(|(_, status)| status)
        .unwrap_or(OutcomeStatus::Error)
}

/// Executes tool invocations against the bookmark collaborators.
#[derive(Clone)]
pub struct ToolDispatcher {
    repository: BookmarkRepository,
    fetcher: Arc<dyn PageFetcher>,
    summarizer: PageSummarizer,
    classifier: CategoryClassifier,
}

impl ToolDispatcher {
    pub fn new(
        repository: BookmarkRepository,
        fetcher: Arc<dyn PageFetcher>,
        summarizer: PageSummarizer,
        classifier: CategoryClassifier,
    ) -> Self {
        Self {
            repository,
            fetcher,
            summarizer,
            classifier,
        }
    }

    /// Run one invocation. Failures become `error` envelopes.
    pub async fn execute(&self, invocation: ToolInvocation) -> ToolOutcome {
        let tool = invocation.kind().name();
        info!(tool = %tool, "Dispatching tool call");

        let result = match invocation {
            ToolInvocation::AddBookmarks(args) => self.add_bookmarks(args).await,
            ToolInvocation::DeleteBookmarks(args) => self.delete_bookmarks(args).await,
            ToolInvocation::DeleteBookmarksByCategory(args) => {
                self.delete_bookmarks_by_category(args).await
            }
            ToolInvocation::MoveBookmark(args) => self.move_bookmark(args).await,
            ToolInvocation::MoveBookmarksByCategory(args) => {
                self.move_bookmarks_by_category(args).await
            }
            ToolInvocation::GetBookmarksByCategory(args) => {
                self.get_bookmarks_by_category(args).await
            }
            ToolInvocation::SearchBookmarks(args) => self.search_bookmarks(args).await,
            ToolInvocation::GetCategories => self.get_categories().await,
        };

        result.unwrap_or_else(|e| {
            warn!(tool = %tool, error = %e, "Tool call failed");
            ToolOutcome::from_error(&e)
        })
    }

    async fn add_bookmarks(&self, args: AddBookmarksArgs) -> AppResult<ToolOutcome> {
        let guidance = args.category_guidance.as_deref();
        let mut results = Vec::with_capacity(args.urls.len());

        for url in &args.urls {
            let outcome = match self.add_bookmark(url, guidance).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to add bookmark");
                    UrlOutcome::error(url, &e)
                }
            };
            results.push(outcome);
        }

        let status = aggregate(
            &results,
            [
                (UrlStatus::Created, OutcomeStatus::Added),
                (UrlStatus::Exists, OutcomeStatus::Exists),
            ],
        );
        let message = match status {
            OutcomeStatus::Added => "Bookmarks added",
            OutcomeStatus::Exists => "Bookmarks already exist",
            _ => "No bookmarks were added",
        };

        Ok(ToolOutcome::new(status, message).with("results", &results))
    }

    async fn add_bookmark(&self, url: &str, guidance: Option<&str>) -> AppResult<UrlOutcome> {
        validate_url(url)?;

        if self.repository.find_by_url(url).await?.is_some() {
            return Ok(UrlOutcome::new(url, UrlStatus::Exists, "Bookmark already exists"));
        }

        let page = self.fetcher.fetch(url).await?;
        let summary = self.summarizer.summarize(&page).await?;
        let bookmark = Bookmark::new(url, page.title, summary)?;

        let existing_categories = self.repository.all_category_paths().await?;
        let category = self
            .classifier
            .classify(&bookmark, &existing_categories, guidance)
            .await?;
        let bookmark = bookmark.with_category(category);

        self.repository.upsert(&bookmark).await?;
        info!(url = %url, category = %bookmark.category, "Bookmark added");

        Ok(UrlOutcome::new(
            url,
            UrlStatus::Created,
            format!("Added '{}' under '{}'", bookmark.title, bookmark.category),
        ))
    }

    async fn delete_bookmarks(&self, args: DeleteBookmarksArgs) -> AppResult<ToolOutcome> {
        let mut results = Vec::with_capacity(args.urls.len());

        for url in &args.urls {
            let outcome = match self.delete_bookmark(url).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(url = %url, error = %e, "Failed to delete bookmark");
                    UrlOutcome::error(url, &e)
                }
            };
            results.push(outcome);
        }

        let status = aggregate(
            &results,
            [
                (UrlStatus::Deleted, OutcomeStatus::Deleted),
                (UrlStatus::NotFound, OutcomeStatus::NotFound),
            ],
        );
        let message = match status {
            OutcomeStatus::Deleted => "Bookmarks deleted",
            OutcomeStatus::NotFound => "Bookmarks not found",
            _ => "No bookmarks were deleted",
        };

        Ok(ToolOutcome::new(status, message).with("results", &results))
    }

    async fn delete_bookmark(&self, url: &str) -> AppResult<UrlOutcome> {
        if self.repository.find_by_url(url).await?.is_none() {
            return Ok(UrlOutcome::new(url, UrlStatus::NotFound, "Bookmark not found"));
        }
        self.repository.delete_by_url(url).await?;
        Ok(UrlOutcome::new(url, UrlStatus::Deleted, "Bookmark deleted"))
    }

    async fn delete_bookmarks_by_category(&self, args: CategoryPathArgs) -> AppResult<ToolOutcome> {
        let bookmarks = self
            .repository
            .find_by_category_prefix(&args.category_path)
            .await?;
        if bookmarks.is_empty() {
            return Ok(ToolOutcome::new(
                OutcomeStatus::NotFound,
                format!("No bookmarks found in category '{}'", args.category_path),
            ));
        }

        for bookmark in &bookmarks {
            self.repository.delete_by_url(&bookmark.url).await?;
        }

        Ok(ToolOutcome::new(
            OutcomeStatus::Deleted,
            format!(
                "Deleted {} bookmarks from category '{}'",
                bookmarks.len(),
                args.category_path
            ),
        )
        .with("count", bookmarks.len()))
    }

    async fn move_bookmark(&self, args: MoveBookmarkArgs) -> AppResult<ToolOutcome> {
        let Some(bookmark) = self.repository.find_by_url(&args.url).await? else {
            return Ok(ToolOutcome::new(
                OutcomeStatus::NotFound,
                format!("Bookmark with URL {} not found", args.url),
            ));
        };

        let bookmark = bookmark.with_category(args.category_path);
        self.repository.upsert(&bookmark).await?;

        Ok(ToolOutcome::new(
            OutcomeStatus::Moved,
            format!("Bookmark moved to '{}'", bookmark.category),
        )
        .with("bookmark", &bookmark))
    }

    async fn move_bookmarks_by_category(&self, args: MoveCategoryArgs) -> AppResult<ToolOutcome> {
        let bookmarks = self
            .repository
            .find_by_category_prefix(&args.parent_path)
            .await?;
        if bookmarks.is_empty() {
            return Ok(ToolOutcome::new(
                OutcomeStatus::NotFound,
                format!("No bookmarks found in category '{}'", args.parent_path),
            ));
        }

        let mut moved = 0usize;
        for bookmark in bookmarks {
            let Some(category) =
                replace_category_prefix(&bookmark.category, &args.parent_path, &args.new_parent_path)
            else {
                continue;
            };
            self.repository
                .upsert(&bookmark.with_category(category))
                .await?;
            moved += 1;
        }

        Ok(ToolOutcome::new(
            OutcomeStatus::Moved,
            format!(
                "Moved {} bookmarks from '{}' to '{}'",
                moved, args.parent_path, args.new_parent_path
            ),
        )
        .with("count", moved))
    }

    async fn get_bookmarks_by_category(&self, args: CategoryPathArgs) -> AppResult<ToolOutcome> {
        let bookmarks = self.repository.find_by_category(&args.category_path).await?;
        Ok(ToolOutcome::new(
            OutcomeStatus::Found,
            format!(
                "Found {} bookmarks in category '{}'",
                bookmarks.len(),
                args.category_path
            ),
        )
        .with("count", bookmarks.len())
        .with("bookmarks", &bookmarks))
    }

    async fn search_bookmarks(&self, args: SearchArgs) -> AppResult<ToolOutcome> {
        let bookmarks = self
            .repository
            .search(&args.query, args.max_results)
            .await?;
        Ok(ToolOutcome::new(
            OutcomeStatus::Found,
            format!("Found {} bookmarks", bookmarks.len()),
        )
        .with("count", bookmarks.len())
        .with("bookmarks", &bookmarks))
    }

    async fn get_categories(&self) -> AppResult<ToolOutcome> {
        let tree = self.repository.category_tree().await?;
        Ok(ToolOutcome::new(OutcomeStatus::Found, "Category structure retrieved")
            .with("categories", &tree))
    }
}
