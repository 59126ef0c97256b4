//! Chat assistant client for a spreadsheet bridge.
//!
//! An ask runs in a fixed order: fetch the sheet (with retry), call the
//! completion API with the conversation, and, when write mode is on, pull an
//! operation batch out of the reply and submit it to the bridge.
//!
//! # Architecture
//!
//! - [`backend`]: the bridge endpoints behind the [`BackendApi`] trait
//! - [`completion`]: OpenAI-compatible chat completions
//! - [`context`]: sheet fetch with health probe and exponential backoff
//! - [`extract`] / [`executor`]: reply scanning and batch submission
//! - [`health`]: interval polling with an advisory pause flag
//! - [`session`] / [`store`]: conversation state and its persistence
//! - [`assistant`]: the ask pipeline tying it together

pub mod assistant;
pub mod backend;
pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod extract;
pub mod fence;
pub mod health;
pub mod prompt;
pub mod session;
pub mod store;

#[cfg(test)]
mod testing;

pub use assistant::{Answer, AskOutcome, Assistant, WriteOutcome};
pub use backend::{BackendApi, HttpBackend};
pub use completion::{ChatMessage, CompletionApi, OpenAiClient};
pub use config::ClientConfig;
pub use context::ContextFetcher;
pub use error::{ClientError, Result};
pub use executor::{OperationOutcome, WriteExecutor, WriteReport};
pub use extract::{extract, OperationBatch, Strategy};
pub use fence::{RequestGate, RequestTicket};
pub use health::{HealthMonitor, MonitorState, PauseHandle};
pub use session::{ConversationTurn, Role, Session};
pub use store::{FileStore, KeyValueStore, MemoryStore};
