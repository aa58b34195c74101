//! Batch-by-batch LLM cleaning

use super::graph::{CompiledGraph, StateGraph, END};
use super::prompt::build_batch_prompt;
use super::state::CleaningState;
use crate::data::Dataset;
use crate::error::{CleanError, Result};
use crate::llm::{CompletionBackend, TokenUsage};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

pub const NODE_NAME: &str = "cleaning_agent";
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Replies for every batch, in batch order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentOutput {
    pub responses: Vec<String>,
    pub usage: TokenUsage,
}

impl AgentOutput {
    pub fn text(&self) -> String {
        self.responses.join("\n")
    }
}

pub struct CleaningAgent {
    graph: CompiledGraph<CleaningState>,
    max_concurrency: usize,
}

impl CleaningAgent {
    pub fn new<B: CompletionBackend + 'static>(backend: B) -> Result<Self> {
        let backend = Arc::new(backend);
        let mut graph = StateGraph::new();
        graph
            .add_node(NODE_NAME, move |state: CleaningState| {
                let backend = Arc::clone(&backend);
                async move {
                    let completion = backend.complete(&state.input_text, None).await?;
                    Ok(CleaningState {
                        input_text: state.input_text,
                        structured_response: completion.text,
                        usage: completion.usage,
                    })
                }
            })
            .add_edge(NODE_NAME, END)
            .set_entry_point(NODE_NAME);

        Ok(Self {
            graph: graph.compile()?,
            max_concurrency: 1,
        })
    }

    /// Batches in flight at once; 0 is treated as 1
    pub fn with_max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.graph = self.graph.with_recursion_limit(limit);
        self
    }

    /// Send each batch through the graph and collect the replies
    pub async fn process_data(&self, dataset: &Dataset, batch_size: usize) -> Result<AgentOutput> {
        let batches = dataset.batches(batch_size)?;
        let total = batches.len();
        if total == 0 {
            log::warn!("Dataset has no rows; nothing to send");
            return Ok(AgentOutput::default());
        }
        log::info!(
            "Cleaning {} rows in {} batches of up to {} (concurrency {})",
            dataset.len(),
            total,
            batch_size,
            self.max_concurrency
        );

        let states: Vec<CleaningState> = stream::iter(batches.map(|batch| {
            let prompt = build_batch_prompt(&batch.to_text_table());
            let index = batch.index;
            async move {
                log::debug!("Batch {}/{} ({} rows)", index + 1, total, batch.data.len());
                self.graph
                    .invoke(CleaningState::new(prompt))
                    .await
                    .map_err(|e| CleanError::BatchFailed {
                        index,
                        source: Box::new(e),
                    })
            }
        }))
        .buffered(self.max_concurrency)
        .try_collect()
        .await?;

        let mut output = AgentOutput::default();
        for state in states {
            output.usage += state.usage;
            output.responses.push(state.structured_response);
        }
        log::info!("Agent finished: {}", output.usage);
        Ok(output)
    }
}
