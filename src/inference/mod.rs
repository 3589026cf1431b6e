//! Model boundary: a text-completion capability the conversation loop is
//! generic over.

pub mod client;

pub use client::InferenceClient;

use crate::types::ChatMessage;
use anyhow::Result;
use async_trait::async_trait;

/// Produces raw generated text for a conversation context.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}
