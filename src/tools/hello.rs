//! `say_hello` — greet someone by name.

use super::error::ToolError;
use super::traits::{string_arg, ParamType, ToolDescriptor, ToolHandler, ToolParameter};
use async_trait::async_trait;
use serde_json::{Map, Value};

pub const NAME: &str = "say_hello";

#[derive(Debug, Clone, Default)]
pub struct SayHello;

#[async_trait]
impl ToolHandler for SayHello {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.into(),
            description: "当需要向某人打招呼时使用此工具。例如：向Tom打招呼。".into(),
            parameters: vec![ToolParameter::required(
                "name",
                ParamType::String,
                "需要打招呼的对象名称",
            )],
        }
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let name = string_arg(args, "name", None)?;
        if name.trim().is_empty() {
            return Err(ToolError::InvalidArguments("'name' must not be empty".into()));
        }
        Ok(Value::String(format!("👋 你好 {}！今天过得怎么样？", name.trim())))
    }
}
