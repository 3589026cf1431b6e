//! Result formatter: turns a tool payload into display text.

use crate::tools::{hello, weather};
use crate::types::ToolInvocationResult;
use serde_json::Value;

/// Render a tool payload using the tool's template.
///
/// Unknown tools fall back to plain stringification. Missing fields render
/// as empty strings.
pub fn format_payload(payload: &Value, tool_name: &str) -> String {
    match tool_name {
        weather::NAME => format!(
            "🌆 {}天气\n\
             🌤 天气现象：{}\n\
             🌡 实时气温：{}℃\n\
             💨 风向风力：{} {}级\n\
             💧 空气湿度：{}%\n\
             🕒 更新时间：{}",
            field(payload, "city"),
            field(payload, "weather"),
            field(payload, "temperature"),
            field(payload, "winddirection"),
            field(payload, "windpower"),
            field(payload, "humidity"),
            field(payload, "reporttime"),
        ),
        hello::NAME => format!("✨ {}", stringify(payload)),
        _ => stringify(payload),
    }
}

/// Render a full invocation result as it is shown to the user.
pub fn format_result(result: &ToolInvocationResult) -> String {
    if result.success {
        let body = result
            .payload
            .as_ref()
            .map(|p| format_payload(p, &result.tool_name))
            .unwrap_or_default();
        format!("✅ 处理成功\n{}", body)
    } else {
        format!("❌ 查询失败：{}", result.error.as_deref().unwrap_or("unknown error"))
    }
}

fn field(payload: &Value, key: &str) -> String {
    payload.get(key).map(stringify).unwrap_or_default()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
