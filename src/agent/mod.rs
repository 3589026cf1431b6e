pub mod context;
pub mod format;
pub mod injection_defense;
pub mod loop_;
pub mod parser;
pub mod system_prompt;

pub use format::{format_payload, format_result};
pub use loop_::{ConversationLoop, LoopState, TurnOutcome};
pub use parser::{parse_response, BlockOutcome, ParsedResponse};
