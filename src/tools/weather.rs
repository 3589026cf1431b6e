//! `get_weather` — live weather for a city via the AMap client.

use super::error::ToolError;
use super::traits::{string_arg, ParamType, ToolDescriptor, ToolHandler, ToolParameter};
use crate::amap::AmapClient;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

pub const NAME: &str = "get_weather";

/// City queried when the model omits `cityname`.
const DEFAULT_CITY: &str = "成都";

#[derive(Debug, Clone)]
pub struct GetWeather {
    client: AmapClient,
}

impl GetWeather {
    pub fn new(client: AmapClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ToolHandler for GetWeather {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: NAME.into(),
            description: "获取指定城市的天气信息。例如：查询北京天气。".into(),
            parameters: vec![ToolParameter::optional(
                "cityname",
                ParamType::String,
                "需要查询天气的城市名称",
                json!(DEFAULT_CITY),
            )],
        }
    }

    async fn call(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let city = string_arg(args, "cityname", Some(DEFAULT_CITY))?;
        let live = self.client.weather(&city).await?;
        serde_json::to_value(live).map_err(|e| ToolError::Failed(e.to_string()))
    }
}
