//! AMap client error types.

use crate::types::FailureKind;

/// Error returned by the AMap client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmapError {
    /// Timeout, connection error, non-2xx status or an unreadable body.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// A 2xx JSON body that does not have the documented shape.
    #[error("unexpected response from {endpoint}: {message}")]
    UnexpectedResponse { endpoint: String, message: String },

    /// The district lookup reported failure or matched nothing.
    #[error("could not resolve '{place}': {info}")]
    ResolutionFailed { place: String, info: String },

    /// The weather endpoint reported failure or returned no records.
    #[error("no weather data for district {code}: {info}")]
    DataUnavailable { code: String, info: String },
}

impl AmapError {
    /// Transport failures may succeed on retry; API-reported failures will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport { .. } | Self::UnexpectedResponse { .. } => FailureKind::TransportFailure,
            Self::ResolutionFailed { .. } => FailureKind::ResolutionFailed,
            Self::DataUnavailable { .. } => FailureKind::DataUnavailable,
        }
    }
}
