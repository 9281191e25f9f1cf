//! Server configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every setting has a default so the server boots with an empty
//! environment. Parsing goes through a lookup closure so tests never touch
//! the process environment. LLM settings live in [`crate::llm::config`].

use std::path::PathBuf;

use crate::rate_limit::RateLimitConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_AGENT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_AGENT_MAX_TOOL_ITERATIONS: usize = 5;
pub const DEFAULT_YOUTUBE_API_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub upload_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub agent: AgentSettings,
    pub youtube: YoutubeConfig,
    pub wikipedia: WikipediaConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSettings {
    pub max_tokens: u32,
    pub max_tool_iterations: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self { max_tokens: DEFAULT_AGENT_MAX_TOKENS, max_tool_iterations: DEFAULT_AGENT_MAX_TOOL_ITERATIONS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YoutubeConfig {
    /// `None` when `YOUTUBE_API_KEY` is unset or blank.
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikipediaConfig {
    pub enabled: bool,
    pub api_url: String,
}

impl AppConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("AGENT_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|v| v.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: lookup("AGENT_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            debug: parse_bool(lookup("AGENT_DEBUG").as_deref()).unwrap_or(false),
            upload_dir: lookup("UPLOAD_DIR").map_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR), PathBuf::from),
            upload_max_bytes: parse_or(lookup("UPLOAD_MAX_BYTES"), DEFAULT_UPLOAD_MAX_BYTES),
            agent: AgentSettings {
                max_tokens: parse_or(lookup("AGENT_MAX_TOKENS"), DEFAULT_AGENT_MAX_TOKENS),
                max_tool_iterations: parse_or(lookup("AGENT_MAX_TOOL_ITERATIONS"), DEFAULT_AGENT_MAX_TOOL_ITERATIONS),
            },
            youtube: YoutubeConfig {
                api_key: lookup("YOUTUBE_API_KEY").filter(|k| !k.trim().is_empty()),
                base_url: lookup("YOUTUBE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_YOUTUBE_API_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            wikipedia: WikipediaConfig {
                enabled: parse_bool(lookup("WIKIPEDIA_TOOL_ENABLED").as_deref()).unwrap_or(true),
                api_url: lookup("WIKIPEDIA_API_URL").unwrap_or_else(|| DEFAULT_WIKIPEDIA_API_URL.to_string()),
            },
            rate_limit: RateLimitConfig::from_lookup(&lookup),
        }
    }

    /// `host:port` string suitable for `TcpListener::bind`.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

/// Parse `raw` as `T`, falling back to `default` when absent or invalid.
pub(crate) fn parse_or<T>(raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    raw.and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn parse_bool(raw: Option<&str>) -> Option<bool> {
    raw.and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
