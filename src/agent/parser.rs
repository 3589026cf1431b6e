//! Response parser: extracts tool-invocation blocks from raw model output.
//!
//! Parsing runs in three steps:
//! 1. scan the text for `<tool_call>` … `</tool_call>` marker pairs,
//! 2. decode each body as a JSON object with `name` and `arguments`,
//! 3. decode `arguments` a second time when the model string-encoded it.
//!
//! Each block yields a [`BlockOutcome`]; malformed blocks are reported and
//! dropped without affecting the others.

use crate::types::{ToolInvocationRequest, TOOL_CALL_CLOSE, TOOL_CALL_OPEN};
use serde_json::{Map, Value};
use std::ops::Range;
use tracing::{debug, warn};

/// End-of-turn tokens a chat template may leave at the end of the output.
const END_OF_TURN_TOKENS: &[&str] = &["<|im_end|>", "<|endoftext|>", "<|eot_id|>"];

/// A marker pair found in the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock<'a> {
    /// Byte range of the whole block, markers included.
    pub span: Range<usize>,
    /// Text between the markers, trimmed.
    pub body: &'a str,
}

/// Why a block was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("body is not a JSON object")]
    NotAnObject,
    #[error("missing or non-string 'name'")]
    MissingName,
    #[error("missing 'arguments'")]
    MissingArguments,
    #[error("'arguments' is neither an object nor a JSON-encoded object")]
    InvalidArguments,
}

/// Result of decoding one block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Valid(ToolInvocationRequest),
    Malformed { raw: String, reason: MalformedReason },
}

/// Parsed model output for one turn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedResponse {
    /// Free text: the leading preamble when tool calls were found,
    /// otherwise the whole sanitized output.
    pub content: String,
    /// Valid requests, in document order.
    pub requests: Vec<ToolInvocationRequest>,
    /// Blocks that were dropped.
    pub malformed: Vec<BlockOutcome>,
}

impl ParsedResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Strip a trailing end-of-turn token, if any.
pub fn strip_end_of_turn(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    END_OF_TURN_TOKENS
        .iter()
        .find_map(|tok| trimmed.strip_suffix(tok))
        .unwrap_or(raw)
}

/// Find every complete marker pair, in document order.
///
/// An opening marker without a matching close ends the scan.
pub fn scan_blocks(text: &str) -> Vec<RawBlock<'_>> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(rel_open) = text[cursor..].find(TOOL_CALL_OPEN) {
        let open = cursor + rel_open;
        let body_start = open + TOOL_CALL_OPEN.len();
        let Some(rel_close) = text[body_start..].find(TOOL_CALL_CLOSE) else {
            debug!("Unterminated {} at byte {}", TOOL_CALL_OPEN, open);
            break;
        };
        let body_end = body_start + rel_close;
        let end = body_end + TOOL_CALL_CLOSE.len();
        blocks.push(RawBlock {
            span: open..end,
            body: text[body_start..body_end].trim(),
        });
        cursor = end;
    }

    blocks
}

/// Decode the body of one block.
pub fn decode_block(body: &str) -> BlockOutcome {
    match decode_request(body) {
        Ok(request) => BlockOutcome::Valid(request),
        Err(reason) => BlockOutcome::Malformed {
            raw: body.to_string(),
            reason,
        },
    }
}

fn decode_request(body: &str) -> Result<ToolInvocationRequest, MalformedReason> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| MalformedReason::InvalidJson(e.to_string()))?;
    let Value::Object(mut obj) = value else {
        return Err(MalformedReason::NotAnObject);
    };

    let name = match obj.remove("name") {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        _ => return Err(MalformedReason::MissingName),
    };

    let arguments = match obj.remove("arguments") {
        Some(Value::Object(args)) => args,
        Some(Value::String(encoded)) => decode_string_arguments(&encoded)?,
        Some(_) => return Err(MalformedReason::InvalidArguments),
        None => return Err(MalformedReason::MissingArguments),
    };

    Ok(ToolInvocationRequest { name, arguments })
}

fn decode_string_arguments(encoded: &str) -> Result<Map<String, Value>, MalformedReason> {
    match serde_json::from_str::<Value>(encoded) {
        Ok(Value::Object(args)) => Ok(args),
        _ => Err(MalformedReason::InvalidArguments),
    }
}

/// Parse raw model output into free text plus tool-invocation requests.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let text = strip_end_of_turn(raw);
    let blocks = scan_blocks(text);

    let mut requests = Vec::new();
    let mut malformed = Vec::new();
    for block in &blocks {
        match decode_block(block.body) {
            BlockOutcome::Valid(request) => requests.push(request),
            BlockOutcome::Malformed { raw, reason } => {
                warn!("Dropping malformed tool call ({}): {}", reason, raw);
                malformed.push(BlockOutcome::Malformed { raw, reason });
            }
        }
    }

    if requests.is_empty() {
        return ParsedResponse {
            content: text.to_string(),
            requests,
            malformed,
        };
    }

    // Only the text before the first block is kept.
    let offset = blocks.first().map(|b| b.span.start).unwrap_or(0);
    let preamble = &text[..offset];
    let content = if preamble.trim().is_empty() {
        String::new()
    } else {
        preamble.to_string()
    };

    ParsedResponse {
        content,
        requests,
        malformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn block(body: &str) -> String {
        format!("{}\n{}\n{}", TOOL_CALL_OPEN, body, TOOL_CALL_CLOSE)
    }

    #[test]
    fn empty_output_is_empty_reply() {
        let parsed = parse_response("");
        assert_eq!(parsed, ParsedResponse::default());
    }

    #[test]
    fn plain_text_strips_end_of_turn() {
        let parsed = parse_response("今天天气不错。<|im_end|>");
        assert_eq!(parsed.content, "今天天气不错。");
        assert!(!parsed.has_tool_calls());
    }

    #[test]
    fn extracts_greeting_call() {
        let raw = format!(
            "{}<|im_end|>",
            block(r#"{"name": "say_hello", "arguments": {"name": "Tom"}}"#)
        );
        let parsed = parse_response(&raw);
        assert_eq!(parsed.content, "");
        assert_eq!(parsed.requests.len(), 1);
        assert_eq!(parsed.requests[0].name, "say_hello");
        assert_eq!(parsed.requests[0].arguments["name"], "Tom");
    }

    #[test]
    fn keeps_only_leading_preamble() {
        let raw = format!(
            "好的，我来查一下。\n{}\n中间的话\n{}\n结尾",
            block(r#"{"name": "get_weather", "arguments": {"cityname": "北京"}}"#),
            block(r#"{"name": "say_hello", "arguments": {"name": "Ann"}}"#),
        );
        let parsed = parse_response(&raw);
        assert_eq!(parsed.content, "好的，我来查一下。\n");
        let names: Vec<_> = parsed.requests.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["get_weather", "say_hello"]);
    }

    #[test]
    fn string_encoded_arguments_are_decoded() {
        let raw = block(r#"{"name": "get_weather", "arguments": "{\"cityname\": \"北京\"}"}"#);
        let parsed = parse_response(&raw);
        assert_eq!(parsed.requests[0].arguments["cityname"], "北京");
    }

    #[test]
    fn non_object_arguments_are_malformed() {
        for body in [
            r#"{"name": "x", "arguments": 3}"#,
            r#"{"name": "x", "arguments": "[1, 2]"}"#,
            r#"{"name": "x", "arguments": "not json"}"#,
            r#"{"name": "x"}"#,
            r#"{"arguments": {}}"#,
            r#"["x"]"#,
        ] {
            assert!(
                matches!(decode_block(body), BlockOutcome::Malformed { .. }),
                "expected malformed: {}",
                body
            );
        }
    }

    #[test]
    fn malformed_block_is_dropped_not_fatal() {
        let raw = format!(
            "{}{}{}",
            block(r#"{"name": "say_hello", "arguments": {"name": "A"}}"#),
            block(r#"{"name": "say_hello", "arguments": {"#),
            block(r#"{"name": "say_hello", "arguments": {"name": "B"}}"#),
        );
        let parsed = parse_response(&raw);
        assert_eq!(parsed.requests.len(), 2);
        assert_eq!(parsed.malformed.len(), 1);
        assert_eq!(parsed.requests[1].arguments["name"], "B");
    }

    #[test]
    fn all_malformed_falls_back_to_plain_reply() {
        let raw = block("oops");
        let parsed = parse_response(&raw);
        assert!(parsed.requests.is_empty());
        assert_eq!(parsed.content, raw);
        assert_eq!(parsed.malformed.len(), 1);
    }

    #[test]
    fn unterminated_block_is_ignored() {
        let raw = format!(
            "{}{}{{\"name\": \"x\"",
            block(r#"{"name": "say_hello", "arguments": {"name": "A"}}"#),
            TOOL_CALL_OPEN
        );
        let parsed = parse_response(&raw);
        assert_eq!(parsed.requests.len(), 1);
    }

    #[test]
    fn scan_reports_spans_in_order() {
        let text = format!("ab{}cd", block("{}"));
        let blocks = scan_blocks(&text);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].span.start, 2);
        assert_eq!(blocks[0].span.end, text.len() - 2);
        assert_eq!(blocks[0].body, "{}");
    }

    #[test]
    fn unregistered_names_are_not_filtered() {
        let parsed = parse_response(&block(r#"{"name": "launch_rocket", "arguments": {}}"#));
        assert_eq!(parsed.requests[0].name, "launch_rocket");
    }

    proptest! {
        #[test]
        fn plain_text_is_returned_sanitized(text in "[^<]{0,200}") {
            let parsed = parse_response(&text);
            prop_assert!(parsed.requests.is_empty());
            prop_assert_eq!(parsed.content, strip_end_of_turn(&text));
            prop_assert_eq!(strip_end_of_turn(&text), text.as_str());
        }

        #[test]
        fn valid_blocks_round_trip(
            name in "[a-z_]{1,16}",
            args in proptest::collection::btree_map("[a-z]{1,8}", "[a-zA-Z0-9 ]{0,12}", 0..4),
        ) {
            let arguments: Map<String, Value> =
                args.into_iter().map(|(k, v)| (k, json!(v))).collect();
            let request = ToolInvocationRequest::new(name, arguments);
            let parsed = parse_response(&request.to_block());
            prop_assert_eq!(parsed.requests, vec![request]);
        }

        #[test]
        fn one_malformed_among_n_yields_n_minus_one(n in 1usize..6, bad in 0usize..6) {
            let bad = bad % n;
            let raw: String = (0..n)
                .map(|i| {
                    if i == bad {
                        block("{\"name\": ")
                    } else {
                        block(&format!(r#"{{"name": "t{}", "arguments": {{}}}}"#, i))
                    }
                })
                .collect();
            let parsed = parse_response(&raw);
            prop_assert_eq!(parsed.requests.len(), n - 1);
            prop_assert_eq!(parsed.malformed.len(), 1);
        }
    }
}
