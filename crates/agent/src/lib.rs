//! The chat agent: classify, optionally retrieve, generate.
//!
//! Every message takes one of two paths:
//!
//! 1. **Context-specific**: the message is about the owner, so it is embedded,
//!    the nearest profile documents are fetched and the reply is grounded in them
//! 2. **Generic**: anything else gets a short reminder of what the assistant is for
//!
//! Both paths read and extend the session's conversation context.

pub mod format;
pub mod intent;
pub mod orchestrator;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use format::format_text;
pub use intent::Intent;
pub use orchestrator::{ChatOrchestrator, ChatOutcome, RetrievalSettings, combine_documents};
pub use prompts::Prompts;
