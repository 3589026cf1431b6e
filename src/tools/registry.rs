//! Tool registry: a fixed catalog of tools, indexed by name.

use super::error::RegistryError;
use super::traits::{ToolDescriptor, ToolHandler};
use std::collections::HashMap;
use std::sync::Arc;

/// A registered tool: its descriptor plus the handler that executes it.
#[derive(Clone)]
pub struct RegisteredTool {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

/// Registry of tool handlers.
///
/// Tools are kept in registration order so that [`ToolRegistry::list`]
/// yields the same sequence on every call.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under the name its descriptor declares.
    pub fn register(&mut self, handler: impl ToolHandler + 'static) -> Result<&mut Self, RegistryError> {
        self.register_shared(Arc::new(handler))
    }

    /// Register a shared handler.
    pub fn register_shared(&mut self, handler: Arc<dyn ToolHandler>) -> Result<&mut Self, RegistryError> {
        let descriptor = handler.descriptor();
        if self.index.contains_key(&descriptor.name) {
            return Err(RegistryError::DuplicateToolName(descriptor.name));
        }
        self.index.insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool { descriptor, handler });
        Ok(self)
    }

    /// Find a tool by name.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool, RegistryError> {
        self.index
            .get(name)
            .and_then(|&i| self.tools.get(i))
            .ok_or_else(|| RegistryError::ToolNotFound(name.to_string()))
    }

    /// Descriptors of all registered tools, in registration order.
    pub fn list(&self) -> impl Iterator<Item = &ToolDescriptor> + '_ {
        self.tools.iter().map(|t| &t.descriptor)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
