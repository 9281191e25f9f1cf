//! YouTube Data API v3 search client.
//!
//! Failures never reach the caller: a missing key yields a placeholder
//! result and request errors are logged and yield an empty list, which sends
//! the agent down the plain-text path.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::YoutubeConfig;

pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const KEY_NOT_CONFIGURED_TITLE: &str = "YouTube API key not configured";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// A single video search hit as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
    pub channel: String,
}

#[derive(Debug, thiserror::Error)]
pub enum YoutubeError {
    #[error("YouTube request failed: {0}")]
    Request(String),
    #[error("YouTube API error: status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("YouTube response parse failed: {0}")]
    Parse(String),
}

pub struct YoutubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl YoutubeClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &YoutubeConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Search for videos matching `query`.
    ///
    /// Returns a single placeholder entry when no API key is configured and
    /// an empty list when the API call fails.
    pub async fn search(&self, query: &str, max_results: u32) -> Vec<Video> {
        let Some(api_key) = self.api_key.as_deref() else {
            return vec![Video {
                title: KEY_NOT_CONFIGURED_TITLE.to_string(),
                url: String::new(),
                thumbnail: String::new(),
                channel: String::new(),
            }];
        };

        match self.try_search(api_key, query, max_results).await {
            Ok(videos) => {
                debug!(query, count = videos.len(), "youtube: search complete");
                videos
            }
            Err(e) => {
                warn!(query, error = %e, "youtube: search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, api_key: &str, query: &str, max_results: u32) -> Result<Vec<Video>, YoutubeError> {
        let url = format!("{}/search", self.base_url);
        let max_results = max_results.to_string();
        let response = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("type", "video"),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| YoutubeError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| YoutubeError::Request(e.to_string()))?;
        if status != 200 {
            return Err(YoutubeError::Status { status, body: text });
        }
        parse_search_response(&text)
    }
}

pub(crate) fn parse_search_response(json_text: &str) -> Result<Vec<Video>, YoutubeError> {
    let root: Value = serde_json::from_str(json_text).map_err(|e| YoutubeError::Parse(e.to_string()))?;
    let Some(items) = root.get("items").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let text_at = |item: &Value, pointer: &str| {
        item.pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let videos = items
        .iter()
        .filter_map(|item| {
            let video_id = item.pointer("/id/videoId").and_then(Value::as_str)?;
            Some(Video {
                title: text_at(item, "/snippet/title"),
                url: format!("https://www.youtube.com/watch?v={video_id}"),
                thumbnail: text_at(item, "/snippet/thumbnails/medium/url"),
                channel: text_at(item, "/snippet/channelTitle"),
            })
        })
        .collect();
    Ok(videos)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
