//! Tool Agent — a minimal tool-calling agent runtime.
//!
//! A language model answers in free text and may embed `<tool_call>`
//! blocks; the runtime extracts them, runs the named tools, and weaves the
//! results back into the conversation.

pub mod agent;
pub mod amap;
pub mod config;
pub mod inference;
pub mod setup;
pub mod tools;
pub mod types;
