//! Conversation loop: Read → Think → Act → Reply.
//!
//! Each turn:
//! 1. Reads one line of user input (the exit sentinel ends the session)
//! 2. Builds context (system prompt, tools, history window, new input)
//! 3. Calls the model
//! 4. Parses tool-call blocks out of the raw output
//! 5. Dispatches each request in order
//! 6. Formats and prints the outcome, then appends the turn to history

use crate::agent::{context, format, injection_defense, parser, system_prompt};
use crate::config::AgentConfig;
use crate::inference::ModelClient;
use crate::tools::{self, ToolRegistry};
use crate::types::*;
use anyhow::{Context, Result};
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Prompt printed before each read.
pub const INPUT_PROMPT: &str = "请输入你的需求（输入“退出”结束对话）：";

/// States the loop moves through while handling a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    BuildingContext,
    AwaitingModelOutput,
    Parsing,
    Dispatching,
    Formatting,
    Ended,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AwaitingInput => write!(f, "awaiting_input"),
            Self::BuildingContext => write!(f, "building_context"),
            Self::AwaitingModelOutput => write!(f, "awaiting_model_output"),
            Self::Parsing => write!(f, "parsing"),
            Self::Dispatching => write!(f, "dispatching"),
            Self::Formatting => write!(f, "formatting"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// What one completed turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Free text from the model (the preamble when tools were called).
    pub content: String,
    /// Results of the dispatched tool calls, in request order.
    pub results: Vec<ToolInvocationResult>,
    /// Text shown to the user.
    pub display: String,
}

/// Drives turns against a model and a tool registry.
///
/// Owns the conversation history; nothing else mutates it.
pub struct ConversationLoop<M: ModelClient> {
    config: AgentConfig,
    registry: ToolRegistry,
    model: M,
    history: Vec<ConversationTurn>,
    state: LoopState,
}

impl<M: ModelClient> ConversationLoop<M> {
    pub fn new(config: AgentConfig, registry: ToolRegistry, model: M) -> Self {
        Self {
            config,
            registry,
            model,
            history: Vec::new(),
            state: LoopState::AwaitingInput,
        }
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    fn transition(&mut self, next: LoopState) {
        debug!("Loop state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Run until the exit sentinel or end of input.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("Starting conversation loop for '{}'", self.config.name);
        let mut lines = input.lines();

        loop {
            self.transition(LoopState::AwaitingInput);
            output.write_all(INPUT_PROMPT.as_bytes()).await?;
            output.flush().await?;

            let Some(line) = lines.next_line().await.context("Failed to read input")? else {
                info!("Input closed");
                break;
            };
            if self.config.is_exit(&line) {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }

            let display = match self.run_turn(&line).await {
                Ok(outcome) => outcome.display,
                Err(e) => {
                    error!("Turn failed: {:#}", e);
                    format!("❌ 错误: {:#}", e)
                }
            };
            output.write_all(format!("\n{}\n\n", display).as_bytes()).await?;
            output.flush().await?;
        }

        self.transition(LoopState::Ended);
        output.flush().await?;
        info!("Conversation loop exited after {} history entries", self.history.len());
        Ok(())
    }

    /// Handle one user utterance.
    ///
    /// History is only extended when the turn completes; on error the
    /// history is left exactly as it was.
    pub async fn run_turn(&mut self, input: &str) -> Result<TurnOutcome> {
        let result = self.process(input).await;
        if result.is_err() {
            self.transition(LoopState::AwaitingInput);
        }
        result
    }

    async fn process(&mut self, input: &str) -> Result<TurnOutcome> {
        self.transition(LoopState::BuildingContext);
        let user_input = injection_defense::sanitize_user_input(input);
        let prompt = system_prompt::build_system_prompt(
            &self.config,
            self.registry.list(),
            chrono::Local::now().date_naive(),
        );
        let messages = context::build_messages(
            &prompt,
            &self.history,
            self.config.history_window,
            &user_input,
        );

        self.transition(LoopState::AwaitingModelOutput);
        let raw = self
            .model
            .generate(&messages)
            .await
            .context("Model generation failed")?;
        debug!("Raw model output: {}", raw);

        self.transition(LoopState::Parsing);
        let mut parsed = parser::parse_response(&raw);
        let limit = self.config.max_tool_calls_per_turn;
        if parsed.requests.len() > limit {
            warn!(
                "Model requested {} tool calls, dispatching the first {}",
                parsed.requests.len(),
                limit
            );
            parsed.requests.truncate(limit);
        }

        let mut results = Vec::with_capacity(parsed.requests.len());
        for request in &parsed.requests {
            self.transition(LoopState::Dispatching);
            let result = tools::dispatch(&self.registry, request).await;
            if result.success {
                info!("Tool '{}' succeeded", result.tool_name);
            }
            results.push(result);
        }

        self.transition(LoopState::Formatting);
        let display = render_display(&parsed.content, &results, parsed.has_tool_calls());

        self.history.push(ConversationTurn::user(user_input));
        self.history
            .push(ConversationTurn::assistant(&parsed.content, &parsed.requests));
        for result in &results {
            self.history.push(ConversationTurn::tool(result));
        }

        self.transition(LoopState::AwaitingInput);
        Ok(TurnOutcome {
            content: parsed.content,
            results,
            display,
        })
    }
}

/// Compose the text shown for a turn.
fn render_display(content: &str, results: &[ToolInvocationResult], called_tools: bool) -> String {
    let mut lines = Vec::with_capacity(results.len() + 1);
    if !called_tools || !content.trim().is_empty() {
        lines.push(format!("🤖️ AI: {}", content.trim()));
    }
    for result in results {
        lines.push(format::format_result(result));
    }
    lines.join("\n")
}
