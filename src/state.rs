//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds one long-lived client per external service, built once at
//! startup, plus the in-memory rate limiter.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{AgentSettings, AppConfig};
use crate::llm::LlmChat;
use crate::rate_limit::RateLimiter;
use crate::wikipedia::WikipediaClient;
use crate::youtube::YoutubeClient;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    /// Optional LLM client. `None` if LLM env vars are not configured.
    pub llm: Option<Arc<dyn LlmChat>>,
    pub youtube: Arc<YoutubeClient>,
    /// `None` when the Wikipedia tool plugin is disabled.
    pub wikipedia: Option<Arc<WikipediaClient>>,
    pub rate_limiter: RateLimiter,
    pub agent: AgentSettings,
    pub upload_dir: Arc<PathBuf>,
}

impl AppState {
    /// Build state from config and an already-constructed LLM client.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client for YouTube or Wikipedia cannot be built.
    pub fn new(config: &AppConfig, llm: Option<Arc<dyn LlmChat>>) -> Result<Self, reqwest::Error> {
        let youtube = Arc::new(YoutubeClient::new(&config.youtube)?);
        let wikipedia = if config.wikipedia.enabled {
            Some(Arc::new(WikipediaClient::new(&config.wikipedia)?))
        } else {
            None
        };
        Ok(Self {
            llm,
            youtube,
            wikipedia,
            rate_limiter: RateLimiter::new(config.rate_limit),
            agent: config.agent,
            upload_dir: Arc::new(config.upload_dir.clone()),
        })
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
