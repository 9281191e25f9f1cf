use super::*;
use crate::config::AppConfig;
use crate::llm::types::{ChatResponse, LlmChat, LlmError, Message, StopReason, Tool};
use crate::rate_limit::RateLimitError;
use crate::state::test_helpers;
use std::sync::{Arc, Mutex};

struct MockLlm {
    responses: Mutex<Vec<Result<ChatResponse, LlmError>>>,
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    async fn chat(
        &self,
        _max_tokens: u32,
        _system: &str,
        _messages: &[Message],
        _tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(reply("ok"))
        } else {
            responses.remove(0)
        }
    }
}

fn reply(text: &str) -> ChatResponse {
    ChatResponse {
        text: text.into(),
        tool_calls: Vec::new(),
        model: "mock".into(),
        stop_reason: StopReason::EndTurn,
        input_tokens: 1,
        output_tokens: 1,
    }
}

fn mock(responses: Vec<Result<ChatResponse, LlmError>>) -> Arc<dyn LlmChat> {
    Arc::new(MockLlm { responses: Mutex::new(responses) })
}

fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40_000)))
}

fn request(query: &str) -> Json<AgentRequest> {
    Json(AgentRequest { query: query.into() })
}

#[test]
fn request_without_query_defaults_to_empty() {
    let req: AgentRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(req.query, "");
}

#[tokio::test]
async fn agent_returns_text_reply() {
    let state = test_helpers::test_app_state_with_llm(mock(vec![Ok(reply("Hello there."))]));
    let Json(body) = agent(State(state), peer(), request("hi")).await.unwrap();
    assert_eq!(body.text, "Hello there.");
    assert!(body.videos.is_none());
}

#[tokio::test]
async fn agent_accepts_empty_query() {
    let state = test_helpers::test_app_state_with_llm(mock(vec![]));
    let Json(body) = agent(State(state), peer(), request("")).await.unwrap();
    assert_eq!(body.text, "ok");
}

#[tokio::test]
async fn agent_without_llm_is_unavailable() {
    let err = agent(State(test_helpers::test_app_state()), peer(), request("hi"))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(err.code, "E_LLM_NOT_CONFIGURED");
}

#[tokio::test]
async fn ai_query_rejects_blank_query() {
    let state = test_helpers::test_app_state_with_llm(mock(vec![]));
    let err = ai_query(State(state), peer(), request("   ")).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.message, "Query is required");
}

#[tokio::test]
async fn ai_query_answers_like_agent() {
    let state = test_helpers::test_app_state_with_llm(mock(vec![Ok(reply("42"))]));
    let Json(body) = ai_query(State(state), peer(), request("meaning of life")).await.unwrap();
    assert_eq!(body.text, "42");
}

#[tokio::test]
async fn llm_failure_maps_to_bad_gateway() {
    let state = test_helpers::test_app_state_with_llm(mock(vec![Err(LlmError::ApiResponse {
        status: 503,
        body: "overloaded".into(),
    })]));
    let err = agent(State(state), peer(), request("hi")).await.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_GATEWAY);
    assert_eq!(err.message, "Failed to process query");
    assert_eq!(err.code, "E_LLM_ERROR");
    assert!(err.retryable);
}

#[tokio::test]
async fn rate_limit_maps_to_too_many_requests() {
    let config = AppConfig::from_lookup(|key| match key {
        "RATE_LIMIT_PER_CLIENT" => Some("1".into()),
        "WIKIPEDIA_TOOL_ENABLED" => Some("false".into()),
        _ => None,
    });
    let state = test_helpers::test_app_state_from(&config, Some(mock(vec![])));

    agent(State(state.clone()), peer(), request("one")).await.unwrap();
    let err = agent(State(state), peer(), request("two")).await.unwrap_err();
    assert_eq!(err.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(err.code, "E_RATE_LIMITED");
    assert!(err.retryable);
}

#[test]
fn rate_limit_message_is_kept() {
    let err = AgentError::RateLimited(RateLimitError::GlobalExceeded { limit: 5, window_secs: 60 });
    let api = agent_error_to_api(&err);
    assert_eq!(api.message, "global rate limit exceeded (max 5 requests/60s)");
}
