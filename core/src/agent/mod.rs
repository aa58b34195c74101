//! LLM cleaning agent
//!
//! ```text
//! Dataset ──batches──▶ prompt ──▶ StateGraph [cleaning_agent] ──▶ END
//!                                      │
//!                               CompletionBackend
//! ```
//!
//! Each batch is rendered as a text table, wrapped in the cleaning prompt and
//! run through a one-node graph. The replies are returned as text in batch
//! order.

pub mod cleaner;
pub mod graph;
pub mod prompt;
pub mod state;

pub use cleaner::{AgentOutput, CleaningAgent, DEFAULT_BATCH_SIZE};
pub use graph::{CompiledGraph, StateGraph, DEFAULT_RECURSION_LIMIT, END};
pub use prompt::build_batch_prompt;
pub use state::CleaningState;
