//! Configuration schema for agent.toml.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Human-readable assistant name, used in the system prompt.
    pub name: String,

    /// Base URL of the OpenAI-compatible chat endpoint.
    pub model_api_url: String,

    /// API key for the model endpoint (may be empty for local servers).
    pub model_api_key: String,

    /// Model identifier sent with each request.
    pub model: String,

    /// Maximum new tokens per generation.
    pub max_tokens_per_turn: u32,

    /// Sampling temperature.
    pub temperature: f64,

    /// AMap REST API base URL.
    pub amap_api_url: String,

    /// AMap web-service key.
    pub amap_key: String,

    /// Timeout applied to every outbound HTTP request.
    pub request_timeout_secs: u64,

    /// Number of history messages included when building context.
    pub history_window: usize,

    /// Maximum tool calls dispatched in one turn.
    pub max_tool_calls_per_turn: usize,

    /// Inputs that end the session.
    pub exit_sentinels: Vec<String>,

    /// Extra instructions appended to the system prompt.
    pub extra_instructions: String,

    /// Log level (debug, info, warn, error).
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "Qwen".into(),
            model_api_url: "http://localhost:8000".into(),
            model_api_key: String::new(),
            model: "Qwen/Qwen2.5-1.5B-Instruct".into(),
            max_tokens_per_turn: 512,
            temperature: 0.5,
            amap_api_url: "https://restapi.amap.com".into(),
            amap_key: String::new(),
            request_timeout_secs: 10,
            history_window: 20,
            max_tool_calls_per_turn: 10,
            exit_sentinels: vec!["退出".into(), "结束".into()],
            extra_instructions: String::new(),
            log_level: "warn".into(),
        }
    }
}

impl AgentConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Whether `input` ends the session.
    pub fn is_exit(&self, input: &str) -> bool {
        let input = input.trim();
        self.exit_sentinels.iter().any(|s| s == input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_matches_trimmed_input_exactly() {
        let cfg = AgentConfig::default();
        assert!(cfg.is_exit("退出"));
        assert!(cfg.is_exit(" 结束\n"));
        assert!(!cfg.is_exit("不要退出"));
        assert!(!cfg.is_exit(""));
    }

    #[test]
    fn timeout_is_never_zero() {
        let cfg = AgentConfig {
            request_timeout_secs: 0,
            ..AgentConfig::default()
        };
        assert_eq!(cfg.request_timeout(), Duration::from_secs(1));
    }
}
