//! Message context builder for the conversation loop.
//!
//! Assembles the system prompt, the recent history and the new user turn
//! into the message list handed to the model.

use crate::types::*;
use serde_json::Value;
use tracing::debug;

/// Build the full message list for a generation call.
///
/// Only the last `history_window` history entries are included, widened
/// backwards so the window never opens on a tool result whose assistant
/// call was cut off. The history itself is not modified.
pub fn build_messages(
    system_prompt: &str,
    history: &[ConversationTurn],
    history_window: usize,
    user_input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history_window.min(history.len()) + 2);

    messages.push(ChatMessage::new(ChatRole::System, system_prompt));

    let start = window_start(history, history_window);
    for turn in &history[start..] {
        messages.push(render_turn(turn));
    }

    messages.push(ChatMessage::new(ChatRole::User, user_input));

    debug!("Context: {} messages ({} from history)", messages.len(), history.len() - start);
    messages
}

fn window_start(history: &[ConversationTurn], history_window: usize) -> usize {
    let mut start = history.len().saturating_sub(history_window);
    while start > 0 && start < history.len() && history[start].role == ChatRole::Tool {
        start -= 1;
    }
    start
}

/// Convert a history entry into the message the model sees.
///
/// Assistant tool calls are replayed as `<tool_call>` blocks after the free
/// text. Tool results go back as a user message wrapped in
/// `<tool_response>` tags, the form chat templates without a native tool
/// role expect.
pub fn render_turn(turn: &ConversationTurn) -> ChatMessage {
    match (&turn.role, &turn.content) {
        (_, TurnContent::Text(text)) => ChatMessage::new(turn.role, text.clone()),
        (ChatRole::Assistant, TurnContent::Structured(value)) => {
            ChatMessage::new(ChatRole::Assistant, render_assistant(value))
        }
        (ChatRole::Tool, TurnContent::Structured(value)) => {
            let name = value.get("tool_name").and_then(Value::as_str).unwrap_or("tool");
            ChatMessage::new(
                ChatRole::User,
                format!("<tool_response>\n[{}] {}\n</tool_response>", name, value),
            )
        }
        (role, TurnContent::Structured(value)) => ChatMessage::new(*role, value.to_string()),
    }
}

fn render_assistant(value: &Value) -> String {
    let mut parts = Vec::new();

    if let Some(text) = value.get("content").and_then(Value::as_str) {
        if !text.trim().is_empty() {
            parts.push(text.trim().to_string());
        }
    }

    if let Some(calls) = value.get("tool_calls").and_then(Value::as_array) {
        for call in calls {
            if let Ok(request) = serde_json::from_value::<ToolInvocationRequest>(call.clone()) {
                parts.push(request.to_block());
            }
        }
    }

    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn hello_request() -> ToolInvocationRequest {
        let mut args = Map::new();
        args.insert("name".into(), json!("Tom"));
        ToolInvocationRequest::new("say_hello", args)
    }

    #[test]
    fn system_first_user_last() {
        let msgs = build_messages("sys", &[], 20, "hi");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0], ChatMessage::new(ChatRole::System, "sys"));
        assert_eq!(msgs[1], ChatMessage::new(ChatRole::User, "hi"));
    }

    #[test]
    fn history_is_windowed_to_most_recent() {
        let history: Vec<_> = (0..5).map(|i| ConversationTurn::user(format!("m{}", i))).collect();
        let msgs = build_messages("sys", &history, 2, "now");
        let contents: Vec<_> = msgs.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "m3", "m4", "now"]);
    }

    #[test]
    fn window_keeps_tool_results_with_their_call() {
        let result = ToolInvocationResult::ok("say_hello", json!("👋 你好 Tom"));
        let history = vec![
            ConversationTurn::user("m0"),
            ConversationTurn::user("向Tom打招呼"),
            ConversationTurn::assistant("", &[hello_request(), hello_request()]),
            ConversationTurn::tool(&result),
            ConversationTurn::tool(&result),
        ];
        let msgs = build_messages("sys", &history, 1, "now");
        assert_eq!(msgs.len(), 5);
        assert_eq!(msgs[1].role, ChatRole::Assistant);
        assert!(msgs[1].content.contains("<tool_call>"));
        assert!(msgs[2].content.starts_with("<tool_response>"));
        assert_eq!(msgs[4].content, "now");
    }

    #[test]
    fn assistant_tool_calls_are_replayed_as_blocks() {
        let turn = ConversationTurn::assistant("我来打个招呼", &[hello_request()]);
        let msg = render_turn(&turn);
        assert_eq!(msg.role, ChatRole::Assistant);
        assert!(msg.content.starts_with("我来打个招呼\n<tool_call>\n"));
        assert!(msg.content.contains("\"name\":\"say_hello\""));
        assert!(msg.content.ends_with("</tool_call>"));
    }

    #[test]
    fn tool_results_are_wrapped_as_responses() {
        let result = ToolInvocationResult::ok("say_hello", json!("👋 你好 Tom"));
        let msg = render_turn(&ConversationTurn::tool(&result));
        assert_eq!(msg.role, ChatRole::User);
        assert!(msg.content.starts_with("<tool_response>\n[say_hello] "));
        assert!(msg.content.contains("你好 Tom"));
    }
}
