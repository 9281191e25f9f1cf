//! OpenAI-compatible chat-completions client.
//!
//! DeepSeek, Groq and OpenAI all accept the same `/chat/completions` request
//! shape, so one client covers every provider; only the base URL, key and
//! model differ.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::config::LlmTimeouts;
use super::types::{ChatResponse, LlmError, Message, StopReason, Tool, ToolCall};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, timeouts: LlmTimeouts) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, api_key, base_url: base_url.trim_end_matches('/').to_string() })
    }

    pub async fn chat(
        &self,
        model: &str,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, LlmError> {
        let messages = wire_messages(system, messages);
        let tools: Vec<WireToolDef<'_>> = tools.unwrap_or_default().iter().map(WireToolDef::from).collect();
        let body = WireRequest { model, max_tokens, messages: &messages, tools: &tools };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_completions_response(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if status != 200 {
            return Err(LlmError::ApiResponse { status, body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// REQUEST WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [WireToolDef<'a>],
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl WireMessage {
    fn plain(role: &'static str, content: &str) -> Self {
        Self { role, content: Some(content.to_string()), tool_calls: Vec::new(), tool_call_id: None }
    }
}

#[derive(Debug, Serialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded, as the API expects a string here.
    arguments: String,
}

impl From<&ToolCall> for WireToolCall {
    fn from(call: &ToolCall) -> Self {
        Self {
            id: call.id.clone(),
            kind: "function",
            function: WireFunctionCall { name: call.name.clone(), arguments: call.arguments.to_string() },
        }
    }
}

#[derive(Serialize)]
struct WireToolDef<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionDef<'a>,
}

#[derive(Serialize)]
struct WireFunctionDef<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

impl<'a> From<&'a Tool> for WireToolDef<'a> {
    fn from(tool: &'a Tool) -> Self {
        Self {
            kind: "function",
            function: WireFunctionDef { name: &tool.name, description: &tool.description, parameters: &tool.input_schema },
        }
    }
}

/// Flatten the conversation into chat-completions messages. Each tool
/// output becomes its own `tool` message; failures are prefixed so the model
/// can tell them apart from results.
fn wire_messages(system: &str, messages: &[Message]) -> Vec<WireMessage> {
    let mut out = Vec::with_capacity(messages.len() + 1);
    if !system.trim().is_empty() {
        out.push(WireMessage::plain("system", system));
    }
    for message in messages {
        match message {
            Message::User(text) => out.push(WireMessage::plain("user", text)),
            Message::ToolRequest { text, calls } => out.push(WireMessage {
                role: "assistant",
                content: (!text.is_empty()).then(|| text.clone()),
                tool_calls: calls.iter().map(WireToolCall::from).collect(),
                tool_call_id: None,
            }),
            Message::ToolResults(outputs) => out.extend(outputs.iter().map(|output| WireMessage {
                role: "tool",
                content: Some(if output.is_error {
                    format!("Error: {}", output.content)
                } else {
                    output.content.clone()
                }),
                tool_calls: Vec::new(),
                tool_call_id: Some(output.call_id.clone()),
            })),
        }
    }
    out
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Deserialize)]
struct WireChoice {
    message: Option<WireReply>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireReply {
    content: Option<String>,
    tool_calls: Option<Vec<WireReplyCall>>,
}

#[derive(Deserialize)]
struct WireReplyCall {
    id: Option<String>,
    function: Option<WireReplyFunction>,
}

#[derive(Deserialize)]
struct WireReplyFunction {
    name: Option<String>,
    arguments: Option<String>,
}

pub(crate) fn parse_chat_completions_response(json_text: &str) -> Result<ChatResponse, LlmError> {
    let response: WireResponse = serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))?;
    let (input_tokens, output_tokens) = response
        .usage
        .map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));
    let Some(choice) = response.choices.into_iter().next() else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };

    let (text, raw_calls) = match choice.message {
        Some(reply) => (reply.content.unwrap_or_default(), reply.tool_calls.unwrap_or_default()),
        None => (String::new(), Vec::new()),
    };

    let mut tool_calls = Vec::with_capacity(raw_calls.len());
    for call in raw_calls {
        let Some(function) = call.function else { continue };
        let Some(name) = function.name else { continue };
        let Some(id) = call.id else {
            return Err(LlmError::ApiParse("chat_completions: tool call missing id".to_string()));
        };
        // Malformed argument JSON becomes an empty object.
        let arguments = function
            .arguments
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        tool_calls.push(ToolCall { id, name, arguments });
    }

    let stop_reason = if !tool_calls.is_empty() {
        StopReason::ToolUse
    } else if choice.finish_reason.as_deref() == Some("length") {
        StopReason::MaxTokens
    } else {
        StopReason::EndTurn
    };

    Ok(ChatResponse { text, tool_calls, model: response.model, stop_reason, input_tokens, output_tokens })
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
