//! Agent service — user query → optional YouTube search → LLM reply.
//!
//! DESIGN
//! ======
//! A query that reads like a YouTube request ("search videos about cats")
//! is answered with live search results plus an LLM summary of them. Every
//! other query, and any YouTube query whose search comes back empty, goes to
//! the assistant as-is. The assistant may call the Wikipedia tool in a
//! bounded loop before answering.

use std::fmt::Write;
use std::net::IpAddr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::llm::LlmChat;
use crate::llm::tools::{SEARCH_WIKIPEDIA, agent_tools};
use crate::llm::types::{ChatResponse, LlmError, Message, ToolOutput};
use crate::rate_limit::RateLimitError;
use crate::state::AppState;
use crate::wikipedia::{self, WikipediaError};
use crate::youtube::client::DEFAULT_MAX_RESULTS;
use crate::youtube::{Video, extract_youtube_query};

const ASSISTANT_NAME: &str = "YouTube Expert";
const ASSISTANT_DESCRIPTION: &str =
    "I am an AI assistant specialized in providing information about YouTube videos, channels, and trends.";
const FALLBACK_TEXT: &str = "I don't have an answer for that.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM not configured")]
    LlmNotConfigured,
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("rate limited: {0}")]
    RateLimited(#[from] RateLimitError),
}

impl crate::error::ErrorCode for AgentError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LlmNotConfigured => "E_LLM_NOT_CONFIGURED",
            Self::Llm(_) => "E_LLM_ERROR",
            Self::RateLimited(_) => "E_RATE_LIMITED",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::LlmNotConfigured => false,
            Self::Llm(e) => crate::error::ErrorCode::retryable(e),
            Self::RateLimited(_) => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("tool unavailable: {0}")]
    Unavailable(String),
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Wikipedia(#[from] WikipediaError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    Text,
    YoutubeResults,
}

/// JSON body returned by the agent routes.
#[derive(Debug, Serialize)]
pub struct AgentReply {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ReplyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
}

impl AgentReply {
    #[must_use]
    pub fn text(text: String) -> Self {
        Self { text, kind: ReplyKind::Text, videos: None }
    }

    #[must_use]
    pub fn youtube_results(text: String, videos: Vec<Video>) -> Self {
        Self { text, kind: ReplyKind::YoutubeResults, videos: Some(videos) }
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Answer one user query.
///
/// # Errors
///
/// Returns [`AgentError::RateLimited`] when the caller is over its limits and
/// [`AgentError::Llm`] when the provider call fails. YouTube failures are
/// absorbed and fall back to a plain answer.
pub async fn handle_query(
    state: &AppState,
    llm: &Arc<dyn LlmChat>,
    client: IpAddr,
    query: &str,
) -> Result<AgentReply, AgentError> {
    info!(%client, query_len = query.len(), "agent: query received");

    // Budget first: a rejected request must not take a window slot.
    state.rate_limiter.check_token_budget(client)?;
    state.rate_limiter.check_and_record(client)?;

    if let Some(topic) = extract_youtube_query(query) {
        info!(%topic, "agent: youtube query detected");
        let videos = state.youtube.search(&topic, DEFAULT_MAX_RESULTS).await;

        if !videos.is_empty() {
            let listing = format_video_listing(&topic, &videos);
            let prompt = build_summary_prompt(&topic, &listing);
            let text = run_assistant(state, llm, client, &prompt).await?;
            info!(%topic, videos = videos.len(), "agent: youtube reply complete");
            return Ok(AgentReply::youtube_results(text, videos));
        }
        info!(%topic, "agent: no videos found, answering as text");
    }

    let text = run_assistant(state, llm, client, query).await?;
    info!(text_len = text.len(), "agent: text reply complete");
    Ok(AgentReply::text(text))
}

// =============================================================================
// ASSISTANT LOOP
// =============================================================================

async fn run_assistant(
    state: &AppState,
    llm: &Arc<dyn LlmChat>,
    client: IpAddr,
    prompt: &str,
) -> Result<String, AgentError> {
    let tools = agent_tools(state.wikipedia.is_some());
    let tools_arg = if tools.is_empty() { None } else { Some(tools.as_slice()) };
    let system = build_system_prompt(tools_arg.is_some());
    let max_iterations = state.agent.max_tool_iterations.max(1);

    let mut messages = vec![Message::User(prompt.to_string())];
    let mut final_text: Option<String> = None;

    for iteration in 0..max_iterations {
        let response = llm
            .chat(state.agent.max_tokens, &system, &messages, tools_arg)
            .await?;

        info!(
            iteration,
            model = %response.model,
            stop_reason = response.stop_reason.as_str(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "agent: LLM response"
        );
        state.rate_limiter.record_tokens(client, response.total_tokens());

        let ChatResponse { text, tool_calls, .. } = response;
        if !text.is_empty() {
            final_text = Some(text.clone());
        }
        if tool_calls.is_empty() {
            break;
        }

        let mut outputs = Vec::with_capacity(tool_calls.len());
        for call in &tool_calls {
            info!(iteration, tool = %call.name, "agent: executing tool");
            let output = match execute_tool(state, &call.name, &call.arguments).await {
                Ok(content) => ToolOutput::ok(&call.id, content),
                Err(e) => {
                    warn!(iteration, tool = %call.name, error = %e, "agent: tool error");
                    ToolOutput::error(&call.id, e.to_string())
                }
            };
            outputs.push(output);
        }
        messages.push(Message::ToolRequest { text, calls: tool_calls });
        messages.push(Message::ToolResults(outputs));
    }

    Ok(final_text.unwrap_or_else(|| FALLBACK_TEXT.to_string()))
}

pub(crate) async fn execute_tool(state: &AppState, name: &str, input: &Value) -> Result<String, ToolError> {
    match name {
        SEARCH_WIKIPEDIA => {
            let Some(wiki) = state.wikipedia.as_ref() else {
                return Err(ToolError::Unavailable(name.to_string()));
            };
            let query = input
                .get("query")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or(ToolError::MissingArgument("query"))?;
            let limit = input
                .get("limit")
                .and_then(Value::as_u64)
                .map_or(wikipedia::DEFAULT_LIMIT, |n| u32::try_from(n).unwrap_or(wikipedia::MAX_LIMIT));
            let articles = wiki.search(query, limit).await?;
            Ok(wikipedia::format_articles(query, &articles))
        }
        other => Err(ToolError::UnknownTool(other.to_string())),
    }
}

// =============================================================================
// PROMPTS
// =============================================================================

pub(crate) fn build_system_prompt(tools_enabled: bool) -> String {
    let mut prompt = format!("You are {ASSISTANT_NAME}. {ASSISTANT_DESCRIPTION}\n");
    if tools_enabled {
        prompt.push_str(
            "When a question needs facts you are unsure about, call the search_wikipedia tool \
             and cite the article links you used.\n",
        );
    }
    prompt
}

/// Numbered listing of search hits, one block per video.
pub(crate) fn format_video_listing(topic: &str, videos: &[Video]) -> String {
    let mut out = format!("Here are some YouTube videos about '{topic}':\n\n");
    for (i, video) in videos.iter().enumerate() {
        let _ = write!(out, "{}. {} by {}\n   {}\n\n", i + 1, video.title, video.channel, video.url);
    }
    out
}

pub(crate) fn build_summary_prompt(topic: &str, listing: &str) -> String {
    format!(
        "The user asked about YouTube videos on '{topic}'. Here are the results: {listing} \
         Please provide a helpful, concise summary of these results and any additional context that might be useful."
    )
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
