use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Separator between category path segments.
pub const CATEGORY_SEPARATOR: char = '/';

/// Nested category hierarchy derived from bookmark categories.
///
/// Serializes as nested JSON objects, e.g. `{"Tech": {"AI": {}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryTree {
    children: BTreeMap<String, CategoryTree>,
}

impl CategoryTree {
    /// Build a tree from category paths. Empty paths are skipped.
    pub fn from_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tree = Self::default();
        for path in paths {
            tree.insert(path);
        }
        tree
    }

    /// Insert a path and all of its prefixes
    pub fn insert(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        let mut node = self;
        for segment in path.split(CATEGORY_SEPARATOR) {
            node = node.children.entry(segment.to_string()).or_default();
        }
    }

    /// Whether the full path exists as a node
    pub fn contains(&self, path: &str) -> bool {
        let mut node = self;
        for segment in path.split(CATEGORY_SEPARATOR) {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return false,
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Every prefix of every non-empty category, deduplicated and sorted.
pub fn all_category_paths<'a>(categories: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut paths = BTreeSet::new();
    for category in categories {
        if category.is_empty() {
            continue;
        }
        let segments: Vec<&str> = category.split(CATEGORY_SEPARATOR).collect();
        for end in 1..=segments.len() {
            paths.insert(segments[..end].join("/"));
        }
    }
    paths.into_iter().collect()
}

/// Replace a leading textual `prefix` of `category` with `replacement`.
///
/// Returns `None` when `category` does not start with `prefix`.
pub fn replace_category_prefix(category: &str, prefix: &str, replacement: &str) -> Option<String> {
    category
        .strip_prefix(prefix)
        .map(|rest| format!("{replacement}{rest}"))
}
