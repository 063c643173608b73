//! Web page fetching and text extraction.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Node, Selector};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::FetchConfig;
use crate::error::{FetchError, FetchResult};

/// Title used when a page has no usable `<title>`.
pub const MISSING_TITLE: &str = "No title found";

/// Elements whose text never reaches the extracted content.
const SKIPPED_ELEMENTS: [&str; 6] = ["script", "style", "noscript", "img", "input", "meta"];

/// A fetched page reduced to its title and visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub url: String,
    pub title: String,
    pub text: String,
}

/// Retrieves a page by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<Page>;
}

/// HTTP page fetcher with a browser User-Agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_ms: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Request {
                url: String::new(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> FetchResult<Page> {
        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout_ms: self.timeout_ms,
                }
            } else {
                FetchError::Request {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        };

        let response = self.client.get(url).send().await.map_err(map_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(map_err)?;
        let page = parse_page(url, &body);

        debug!(title = %page.title, text_len = page.text.len(), "Page fetched");
        Ok(page)
    }
}

/// Extract title and body text from an HTML document.
pub fn parse_page(url: &str, html: &str) -> Page {
    let document = Html::parse_document(html);

    Page {
        url: url.to_string(),
        title: extract_title(&document),
        text: extract_text(&document),
    }
}

fn extract_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| MISSING_TITLE.to_string())
}

/// Visible body text, one trimmed text node per line.
fn extract_text(document: &Html) -> String {
    let Some(body) = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
    else {
        return String::new();
    };

    let mut lines = Vec::new();
    for node in body.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        let line = text.trim();
        if !line.is_empty() {
            lines.push(line);
        }
    }

    lines.join("\n")
}
