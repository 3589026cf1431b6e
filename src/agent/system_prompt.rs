//! System prompt builder.
//!
//! Layers (in order):
//! 1. Assistant identity and current date
//! 2. Usage rules for the built-in tools
//! 3. Operator-supplied extra instructions
//! 4. Tool signatures and the required call format

use crate::config::AgentConfig;
use crate::tools::ToolDescriptor;
use crate::types::{TOOL_CALL_CLOSE, TOOL_CALL_OPEN};
use chrono::NaiveDate;
use tracing::debug;

const USAGE_RULES: &str = r#"
# 使用规则

1. 当用户说“向[名字]打招呼”时，必须使用 say_hello 工具
2. 当用户说“查询[城市]天气”时，必须使用 get_weather 工具
3. 不需要工具时直接回答，保持自然友好的语气
4. 始终使用中文
"#;

/// Build the complete system prompt for a turn.
pub fn build_system_prompt<'a>(
    config: &AgentConfig,
    tools: impl IntoIterator<Item = &'a ToolDescriptor>,
    today: NaiveDate,
) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(&format!(
        "You are {}, a helpful assistant.\n\nCurrent Date: {}\n",
        config.name,
        today.format("%Y-%m-%d")
    ));

    prompt.push_str(USAGE_RULES);

    if !config.extra_instructions.trim().is_empty() {
        prompt.push('\n');
        prompt.push_str(config.extra_instructions.trim());
        prompt.push('\n');
    }

    prompt.push_str(&tools_section(tools));

    debug!("System prompt: {} chars", prompt.len());
    prompt
}

/// Tool signatures plus the call format the parser expects.
pub fn tools_section<'a>(tools: impl IntoIterator<Item = &'a ToolDescriptor>) -> String {
    let mut section = String::from(
        "\n# Tools\n\nYou may call one or more functions to assist with the user query.\n\n\
         You are provided with function signatures within <tools></tools> XML tags:\n<tools>\n",
    );
    for tool in tools {
        section.push_str(&tool.function_signature().to_string());
        section.push('\n');
    }
    section.push_str("</tools>\n\n");
    section.push_str(&format!(
        "For each function call, return a json object with function name and arguments \
         within {open}{close} XML tags:\n{open}\n{{\"name\": <function-name>, \"arguments\": <args-json-object>}}\n{close}\n",
        open = TOOL_CALL_OPEN,
        close = TOOL_CALL_CLOSE,
    ));
    section
}
