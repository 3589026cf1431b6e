//! Chat-completions inference over the OpenAI-compatible HTTP API.
//!
//! Tools are advertised in the system prompt and the model answers with
//! `<tool_call>` blocks in its text. Providers that reply with native
//! `tool_calls` instead have them rendered back into blocks, so the
//! response parser remains the single extraction path.

use super::ModelClient;
use crate::types::*;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Inference client for an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    http: reqwest::Client,
}

// -- OpenAI-compatible request/response types --------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallPayload>,
}

#[derive(Debug, Deserialize)]
struct ToolCallPayload {
    function: FunctionCallPayload,
}

#[derive(Debug, Deserialize)]
struct FunctionCallPayload {
    name: String,
    arguments: String,
}

impl InferenceClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        model: &str,
        max_tokens: u32,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build inference HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            temperature,
            http,
        })
    }
}

#[async_trait]
impl ModelClient for InferenceClient {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Inference request to model: {} ({} messages)", self.model, messages.len());

        let mut req = self.http.post(&url).json(&request);
        if !self.api_key.is_empty() {
            req = req.bearer_auth(&self.api_key);
        }
        let resp = req.send().await.context("Inference request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Inference failed ({}): {}", status, body);
        }

        let body: ChatResponse = resp.json().await.context("Failed to parse inference response")?;
        let Some(choice) = body.choices.into_iter().next() else {
            return Ok(String::new());
        };

        Ok(render_message(choice.message))
    }
}

/// Flatten a response message into raw text, native tool calls as blocks.
fn render_message(message: ResponseMessage) -> String {
    let mut text = message.content.unwrap_or_default();
    for tc in message.tool_calls {
        let arguments = serde_json::from_str::<serde_json::Value>(&tc.function.arguments)
            .unwrap_or(serde_json::Value::String(tc.function.arguments));
        let body = serde_json::json!({ "name": tc.function.name, "arguments": arguments });
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&format!("{}\n{}\n{}", TOOL_CALL_OPEN, body, TOOL_CALL_CLOSE));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::parser::parse_response;

    #[test]
    fn request_serializes_roles_lowercase() {
        let messages = vec![
            ChatMessage::new(ChatRole::System, "sys"),
            ChatMessage::new(ChatRole::User, "hi"),
        ];
        let req = ChatRequest {
            model: "qwen2.5",
            messages: &messages,
            max_tokens: 512,
            temperature: 0.5,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "hi");
        assert_eq!(v["max_tokens"], 512);
    }

    #[test]
    fn plain_content_passes_through() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"你好"}}]}"#,
        )
        .unwrap();
        let msg = resp.choices.into_iter().next().unwrap().message;
        assert_eq!(render_message(msg), "你好");
    }

    #[test]
    fn native_tool_calls_become_blocks() {
        let resp: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":null,"tool_calls":[
                {"id":"call_1","type":"function","function":{"name":"get_weather","arguments":"{\"cityname\":\"北京\"}"}}
            ]}}]}"#,
        )
        .unwrap();
        let msg = resp.choices.into_iter().next().unwrap().message;
        let parsed = parse_response(&render_message(msg));
        assert_eq!(parsed.requests.len(), 1);
        assert_eq!(parsed.requests[0].name, "get_weather");
        assert_eq!(parsed.requests[0].arguments["cityname"], "北京");
    }
}
