use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::ValidationError;
use crate::llm::FunctionTool;

/// The operations the assistant can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    AddBookmarks,
    DeleteBookmarks,
    DeleteBookmarksByCategory,
    MoveBookmark,
    MoveBookmarksByCategory,
    GetBookmarksByCategory,
    SearchBookmarks,
    GetCategories,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::AddBookmarks,
        ToolKind::DeleteBookmarks,
        ToolKind::DeleteBookmarksByCategory,
        ToolKind::MoveBookmark,
        ToolKind::MoveBookmarksByCategory,
        ToolKind::GetBookmarksByCategory,
        ToolKind::SearchBookmarks,
        ToolKind::GetCategories,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::AddBookmarks => "add_bookmarks",
            ToolKind::DeleteBookmarks => "delete_bookmarks",
            ToolKind::DeleteBookmarksByCategory => "delete_bookmarks_by_category",
            ToolKind::MoveBookmark => "move_bookmark",
            ToolKind::MoveBookmarksByCategory => "move_bookmarks_by_category",
            ToolKind::GetBookmarksByCategory => "get_bookmarks_by_category",
            ToolKind::SearchBookmarks => "search_bookmarks",
            ToolKind::GetCategories => "get_categories",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Function tool declaration sent to the model.
    pub fn declaration(self) -> FunctionTool {
        let (description, parameters) = match self {
            ToolKind::AddBookmarks => (
                "Add a list of URLs to the user's bookmarks",
                json!({
                    "type": "object",
                    "required": ["urls", "category_guidance"],
                    "properties": {
                        "urls": {
                            "type": "array",
                            "description": "List of URLs to be bookmarked",
                            "items": {"type": "string", "description": "A single URL"}
                        },
                        "category_guidance": {
                            "type": ["string", "null"],
                            "description": "This should be null unless the user has a specific category in mind"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::DeleteBookmarks => (
                "Delete a list of URLs from the user's bookmarks",
                json!({
                    "type": "object",
                    "required": ["urls"],
                    "properties": {
                        "urls": {
                            "type": "array",
                            "description": "List of URLs to be deleted from bookmarks",
                            "items": {"type": "string", "description": "A single URL"}
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::DeleteBookmarksByCategory => (
                "Deletes all bookmarks in a specified category",
                json!({
                    "type": "object",
                    "required": ["category_path"],
                    "properties": {
                        "category_path": {
                            "type": "string",
                            "description": "The category path to delete bookmarks from, e.g., 'Category/Subcategory'"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::MoveBookmark => (
                "Moves a bookmark to a different category",
                json!({
                    "type": "object",
                    "required": ["url", "category_path"],
                    "properties": {
                        "url": {
                            "type": "string",
                            "description": "The URL of the bookmark to move"
                        },
                        "category_path": {
                            "type": "string",
                            "description": "The new category path for the bookmark, e.g., 'Category/Subcategory'"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::MoveBookmarksByCategory => (
                "Moves all bookmarks in a category to a new category",
                json!({
                    "type": "object",
                    "required": ["parent_path", "new_parent_path"],
                    "properties": {
                        "parent_path": {
                            "type": "string",
                            "description": "The parent path of the category to be moved, e.g., 'Category/Subcategory'"
                        },
                        "new_parent_path": {
                            "type": "string",
                            "description": "The new parent path for the category, e.g., 'NewCategory/NewSubcategory'"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::GetBookmarksByCategory => (
                "Returns all bookmarks in a specified category",
                json!({
                    "type": "object",
                    "required": ["category_path"],
                    "properties": {
                        "category_path": {
                            "type": "string",
                            "description": "The category path to retrieve bookmarks from, e.g., 'Category/Subcategory'"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::SearchBookmarks => (
                "Searches for relevant bookmarks using input query. Returns a list of bookmarks including URL, Title, Summary, and Category.",
                json!({
                    "type": "object",
                    "required": ["query", "max_results"],
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "The search query to find relevant bookmarks"
                        },
                        "max_results": {
                            "type": "integer",
                            "description": "Maximum number of search results to return"
                        }
                    },
                    "additionalProperties": false
                }),
            ),
            ToolKind::GetCategories => (
                "Retrieves the current hierarchical structure of all bookmark categories",
                json!({
                    "type": "object",
                    "required": [],
                    "properties": {},
                    "additionalProperties": false
                }),
            ),
        };

        FunctionTool::new(self.name(), description, parameters)
    }
}

/// Declarations for every tool, in a fixed order.
pub fn tool_declarations() -> Vec<FunctionTool> {
    ToolKind::ALL.into_iter().map(ToolKind::declaration).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddBookmarksArgs {
    pub urls: Vec<String>,
    #[serde(default)]
    pub category_guidance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteBookmarksArgs {
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPathArgs {
    pub category_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveBookmarkArgs {
    pub url: String,
    pub category_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveCategoryArgs {
    pub parent_path: String,
    pub new_parent_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchArgs {
    pub query: String,
    pub max_results: usize,
}

/// A tool call with validated arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolInvocation {
    AddBookmarks(AddBookmarksArgs),
    DeleteBookmarks(DeleteBookmarksArgs),
    DeleteBookmarksByCategory(CategoryPathArgs),
    MoveBookmark(MoveBookmarkArgs),
    MoveBookmarksByCategory(MoveCategoryArgs),
    GetBookmarksByCategory(CategoryPathArgs),
    SearchBookmarks(SearchArgs),
    GetCategories,
}

impl ToolInvocation {
    pub fn kind(&self) -> ToolKind {
        match self {
            ToolInvocation::AddBookmarks(_) => ToolKind::AddBookmarks,
            ToolInvocation::DeleteBookmarks(_) => ToolKind::DeleteBookmarks,
            ToolInvocation::DeleteBookmarksByCategory(_) => ToolKind::DeleteBookmarksByCategory,
            ToolInvocation::MoveBookmark(_) => ToolKind::MoveBookmark,
            ToolInvocation::MoveBookmarksByCategory(_) => ToolKind::MoveBookmarksByCategory,
            ToolInvocation::GetBookmarksByCategory(_) => ToolKind::GetBookmarksByCategory,
            ToolInvocation::SearchBookmarks(_) => ToolKind::SearchBookmarks,
            ToolInvocation::GetCategories => ToolKind::GetCategories,
        }
    }
}

/// How a model-issued function call is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Known tool, arguments parsed.
    Invoke(ToolInvocation),
    /// Known tool, arguments rejected.
    Reject {
        tool: ToolKind,
        error: ValidationError,
    },
    /// Not a declared tool.
    Ignored { name: String },
}

/// Resolve a function call by name and raw JSON arguments.
pub fn resolve(name: &str, arguments: &str) -> Dispatch {
    let Some(tool) = ToolKind::from_name(name) else {
        return Dispatch::Ignored {
            name: name.to_string(),
        };
    };

    let parsed = match tool {
        ToolKind::AddBookmarks => parse_arguments(tool, arguments).map(ToolInvocation::AddBookmarks),
        ToolKind::DeleteBookmarks => {
            parse_arguments(tool, arguments).map(ToolInvocation::DeleteBookmarks)
        }
        ToolKind::DeleteBookmarksByCategory => {
            parse_arguments(tool, arguments).map(ToolInvocation::DeleteBookmarksByCategory)
        }
        ToolKind::MoveBookmark => parse_arguments(tool, arguments).map(ToolInvocation::MoveBookmark),
        ToolKind::MoveBookmarksByCategory => {
            parse_arguments(tool, arguments).map(ToolInvocation::MoveBookmarksByCategory)
        }
        ToolKind::GetBookmarksByCategory => {
            parse_arguments(tool, arguments).map(ToolInvocation::GetBookmarksByCategory)
        }
        ToolKind::SearchBookmarks => {
            parse_arguments(tool, arguments).map(ToolInvocation::SearchBookmarks)
        }
        ToolKind::GetCategories => Ok(ToolInvocation::GetCategories),
    };

    match parsed {
        Ok(invocation) => Dispatch::Invoke(invocation),
        Err(error) => Dispatch::Reject { tool, error },
    }
}

/// Parse tool arguments from a JSON string
fn parse_arguments<T: DeserializeOwned>(tool: ToolKind, arguments: &str) -> Result<T, ValidationError> {
    serde_json::from_str(arguments).map_err(|e| ValidationError::InvalidArguments {
        tool_name: tool.name().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("add_bookmark"), None);
    }

    #[test]
    fn test_declarations_are_strict_objects() {
        let declarations = tool_declarations();
        assert_eq!(declarations.len(), 8);
        for tool in declarations {
            assert_eq!(tool.tool_type, "function");
            assert!(tool.strict);
            assert_eq!(tool.parameters["type"], "object");
            assert_eq!(tool.parameters["additionalProperties"], false);
            assert!(tool.parameters["required"].is_array());
        }
    }

    #[test]
    fn test_resolve_known_tool() {
        assert_eq!(
            resolve(
                "add_bookmarks",
                r#"{"urls": ["https://example.com"], "category_guidance": null}"#
            ),
            Dispatch::Invoke(ToolInvocation::AddBookmarks(AddBookmarksArgs {
                urls: vec!["https://example.com".into()],
                category_guidance: None,
            }))
        );
        assert_eq!(
            resolve("get_categories", "{}"),
            Dispatch::Invoke(ToolInvocation::GetCategories)
        );
    }

    #[test]
    fn test_resolve_rejects_bad_arguments() {
        match resolve("move_bookmark", r#"{"url": "https://example.com"}"#) {
            Dispatch::Reject {
                tool,
                error: ValidationError::InvalidArguments { tool_name, .. },
            } => {
                assert_eq!(tool, ToolKind::MoveBookmark);
                assert_eq!(tool_name, "move_bookmark");
            }
            other => panic!("unexpected dispatch: {other:?}"),
        }
        assert!(matches!(
            resolve("search_bookmarks", "not json"),
            Dispatch::Reject { .. }
        ));
    }

    #[test]
    fn test_resolve_ignores_unknown_tools() {
        assert_eq!(
            resolve("launch_rockets", "{}"),
            Dispatch::Ignored {
                name: "launch_rockets".into()
            }
        );
    }
}
