//! Agent routes — `/api/agent` and the `/api/ai/query` gateway alias.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;

use crate::error::ApiError;
use crate::services::agent::{self as agent_svc, AgentError, AgentReply};
use crate::state::AppState;

const LLM_FAILURE_MESSAGE: &str = "Failed to process query";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentRequest {
    pub query: String,
}

/// `POST /api/agent` — answer a query. An empty query is passed through.
pub async fn agent(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    answer(&state, addr.ip(), &req.query).await.map(Json)
}

/// `POST /api/ai/query` — same as [`agent`] but rejects a blank query.
///
/// Whitespace-only counts as blank, not just the empty string. Provider
/// failures map to 502 as on `/api/agent`, not a generic 500.
pub async fn ai_query(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<AgentRequest>,
) -> Result<Json<AgentReply>, ApiError> {
    if req.query.trim().is_empty() {
        return Err(ApiError::bad_request("Query is required"));
    }
    answer(&state, addr.ip(), &req.query).await.map(Json)
}

async fn answer(state: &AppState, client: IpAddr, query: &str) -> Result<AgentReply, ApiError> {
    let Some(llm) = state.llm.as_ref() else {
        return Err(agent_error_to_api(&AgentError::LlmNotConfigured));
    };
    agent_svc::handle_query(state, llm, client, query)
        .await
        .map_err(|e| agent_error_to_api(&e))
}

pub(crate) fn agent_error_to_api(err: &AgentError) -> ApiError {
    match err {
        AgentError::RateLimited(e) => ApiError::from_code(StatusCode::TOO_MANY_REQUESTS, e.to_string(), err),
        AgentError::LlmNotConfigured => ApiError::from_code(StatusCode::SERVICE_UNAVAILABLE, err.to_string(), err),
        AgentError::Llm(e) => {
            error!(error = %e, "agent: LLM call failed");
            ApiError::from_code(StatusCode::BAD_GATEWAY, LLM_FAILURE_MESSAGE, err)
        }
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
