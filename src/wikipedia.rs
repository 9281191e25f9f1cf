//! Wikipedia search — the assistant's tool plugin.
//!
//! Uses the MediaWiki `list=search` API. Output is formatted as a numbered
//! plain-text listing so the model can quote titles and links directly.

use std::fmt::Write;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::WikipediaConfig;

pub const DEFAULT_LIMIT: u32 = 3;
pub const MAX_LIMIT: u32 = 10;
const USER_AGENT: &str = concat!("query-agent/", env!("CARGO_PKG_VERSION"), " (wikipedia search tool)");
const REQUEST_TIMEOUT_SECS: u64 = 15;
const ARTICLE_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern must compile"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiArticle {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum WikipediaError {
    #[error("Wikipedia request failed: {0}")]
    Request(String),
    #[error("Wikipedia API error: status {0}")]
    Status(u16),
    #[error("Wikipedia response parse failed: {0}")]
    Parse(String),
}

pub struct WikipediaClient {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &WikipediaConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { http, api_url: config.api_url.clone() })
    }

    /// Search article titles and bodies. `limit` is clamped to `1..=10`.
    ///
    /// # Errors
    ///
    /// Returns an error when the request fails or the body is not the
    /// expected JSON.
    pub async fn search(&self, query: &str, limit: u32) -> Result<Vec<WikiArticle>, WikipediaError> {
        let limit = limit.clamp(1, MAX_LIMIT).to_string();
        debug!(query, limit = %limit, "wikipedia: searching");

        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", limit.as_str()),
                ("format", "json"),
                ("utf8", "1"),
            ])
            .send()
            .await
            .map_err(|e| WikipediaError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WikipediaError::Status(status.as_u16()));
        }
        let text = response
            .text()
            .await
            .map_err(|e| WikipediaError::Request(e.to_string()))?;
        parse_search_response(&text)
    }
}

pub(crate) fn parse_search_response(json_text: &str) -> Result<Vec<WikiArticle>, WikipediaError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| WikipediaError::Parse(e.to_string()))?;
    let Some(hits) = root.pointer("/query/search").and_then(Value::as_array) else {
        return Err(WikipediaError::Parse("missing query.search".to_string()));
    };

    Ok(hits
        .iter()
        .filter_map(|hit| {
            let title = hit.get("title").and_then(Value::as_str)?;
            let snippet = hit.get("snippet").and_then(Value::as_str).unwrap_or("");
            Some(WikiArticle {
                title: title.to_string(),
                snippet: clean_snippet(snippet),
                url: article_url(title),
            })
        })
        .collect())
}

/// Format articles as the tool result handed back to the model.
#[must_use]
pub fn format_articles(query: &str, articles: &[WikiArticle]) -> String {
    if articles.is_empty() {
        return format!("No Wikipedia articles found for '{query}'.");
    }
    let mut out = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = writeln!(out, "{}. {}\n   {}\n   {}", i + 1, article.title, article.url, article.snippet);
    }
    out.trim_end().to_string()
}

fn article_url(title: &str) -> String {
    format!("{ARTICLE_BASE_URL}{}", title.replace(' ', "_"))
}

fn clean_snippet(snippet: &str) -> String {
    HTML_TAG
        .replace_all(snippet, "")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
#[path = "wikipedia_test.rs"]
mod tests;
