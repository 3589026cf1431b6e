pub mod dispatch;
pub mod error;
pub mod hello;
pub mod registry;
pub mod traits;
pub mod weather;

pub use dispatch::{dispatch, dispatch_all};
pub use error::{RegistryError, ToolError};
pub use registry::{RegisteredTool, ToolRegistry};
pub use traits::{ParamType, ToolDescriptor, ToolHandler, ToolParameter};

use crate::amap::AmapClient;

/// Build the registry of built-in tools, in the order they are advertised.
pub fn builtin_registry(amap: AmapClient) -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    registry
        .register(hello::SayHello)?
        .register(weather::GetWeather::new(amap))?;
    Ok(registry)
}
