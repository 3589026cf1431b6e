//! Tool and registry error types.

use crate::amap::AmapError;
use crate::types::FailureKind;

/// Error raised by a tool handler.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The arguments did not match the tool's declared parameters.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The external weather/geocoding service failed.
    #[error(transparent)]
    Amap(#[from] AmapError),

    /// Any other handler-specific failure.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// The failure class this error is reported under.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Amap(e) => e.kind(),
            Self::InvalidArguments(_) | Self::Failed(_) => FailureKind::HandlerError,
        }
    }
}

/// Error returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("DuplicateToolName: {0}")]
    DuplicateToolName(String),

    #[error("ToolNotFound: {0}")]
    ToolNotFound(String),
}
