//! Minimal state graph
//!
//! Nodes are async functions from state to state. Each node has exactly one
//! outgoing edge, either to another node or to [`END`]. `invoke` walks the
//! graph from the entry point until it reaches `END`.

use crate::error::{CleanError, Result};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Terminal pseudo-node
pub const END: &str = "__end__";

pub const DEFAULT_RECURSION_LIMIT: usize = 25;

type NodeFn<S> = Arc<dyn Fn(S) -> BoxFuture<'static, Result<S>> + Send + Sync>;

/// Graph under construction
pub struct StateGraph<S> {
    nodes: Vec<(String, NodeFn<S>)>,
    edges: Vec<(String, String)>,
    entry: Option<String>,
}

impl<S: Send + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + 'static> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            entry: None,
        }
    }

    pub fn add_node<F, Fut>(&mut self, name: impl Into<String>, node: F) -> &mut Self
    where
        F: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
    {
        let node: NodeFn<S> = Arc::new(move |state| Box::pin(node(state)));
        self.nodes.push((name.into(), node));
        self
    }

    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Check the wiring and freeze the graph
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        let entry = self
            .entry
            .ok_or_else(|| graph_error("graph has no entry point"))?;

        let mut nodes = HashMap::with_capacity(self.nodes.len());
        for (name, node) in self.nodes {
            if name == END {
                return Err(graph_error(format!("'{}' is a reserved node name", END)));
            }
            if nodes.insert(name.clone(), node).is_some() {
                return Err(graph_error(format!("node '{}' is defined twice", name)));
            }
        }

        if !nodes.contains_key(&entry) {
            return Err(graph_error(format!("entry point '{}' is not a node", entry)));
        }

        let mut next = HashMap::with_capacity(self.edges.len());
        for (from, to) in self.edges {
            if !nodes.contains_key(&from) {
                return Err(graph_error(format!("edge starts at unknown node '{}'", from)));
            }
            if to != END && !nodes.contains_key(&to) {
                return Err(graph_error(format!("edge ends at unknown node '{}'", to)));
            }
            if next.insert(from.clone(), to).is_some() {
                return Err(graph_error(format!("node '{}' has more than one outgoing edge", from)));
            }
        }

        if let Some(dangling) = nodes.keys().find(|name| !next.contains_key(*name)) {
            return Err(graph_error(format!("node '{}' has no outgoing edge", dangling)));
        }

        Ok(CompiledGraph {
            nodes,
            next,
            entry,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        })
    }
}

fn graph_error(message: impl Into<String>) -> CleanError {
    CleanError::Graph {
        message: message.into(),
    }
}

/// Executable graph
pub struct CompiledGraph<S> {
    nodes: HashMap<String, NodeFn<S>>,
    next: HashMap<String, String>,
    entry: String,
    recursion_limit: usize,
}

impl<S: Send + 'static> CompiledGraph<S> {
    /// Maximum node executions per invocation
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    pub async fn invoke(&self, mut state: S) -> Result<S> {
        let mut current = self.entry.as_str();
        let mut steps = 0;
        loop {
            if steps >= self.recursion_limit {
                return Err(CleanError::GraphRecursionLimit {
                    limit: self.recursion_limit,
                });
            }
            // Both lookups were checked by compile().
            let node = &self.nodes[current];
            log::debug!("graph step {}: {}", steps, current);
            state = node(state).await?;
            steps += 1;

            let to = self.next[current].as_str();
            if to == END {
                return Ok(state);
            }
            current = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(n: i64) -> impl Fn(i64) -> futures::future::Ready<Result<i64>> + Send + Sync {
        move |s| futures::future::ready(Ok(s + n))
    }

    #[tokio::test]
    async fn test_linear_graph() {
        let mut graph = StateGraph::new();
        graph
            .add_node("one", add(1))
            .add_node("ten", add(10))
            .add_edge("one", "ten")
            .add_edge("ten", END)
            .set_entry_point("one");
        let compiled = graph.compile().unwrap();
        assert_eq!(compiled.invoke(5).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn test_cycle_hits_recursion_limit() {
        let mut graph = StateGraph::new();
        graph
            .add_node("ping", add(1))
            .add_node("pong", add(1))
            .add_edge("ping", "pong")
            .add_edge("pong", "ping")
            .set_entry_point("ping");
        let compiled = graph.compile().unwrap().with_recursion_limit(5);
        let err = compiled.invoke(0).await.unwrap_err();
        assert!(matches!(err, CleanError::GraphRecursionLimit { limit: 5 }));
    }

    #[tokio::test]
    async fn test_node_error_propagates() {
        let mut graph = StateGraph::<i64>::new();
        graph
            .add_node("fail", |_| async { Err(CleanError::invalid_input("boom")) })
            .add_edge("fail", END)
            .set_entry_point("fail");
        let err = graph.compile().unwrap().invoke(0).await.unwrap_err();
        assert!(matches!(err, CleanError::InvalidInput { .. }));
    }

    #[test]
    fn test_compile_errors() {
        let no_entry = {
            let mut g = StateGraph::<i64>::new();
            g.add_node("a", add(1)).add_edge("a", END);
            g
        };
        let unknown_target = {
            let mut g = StateGraph::<i64>::new();
            g.add_node("a", add(1)).add_edge("a", "b").set_entry_point("a");
            g
        };
        let duplicate = {
            let mut g = StateGraph::<i64>::new();
            g.add_node("a", add(1))
                .add_node("a", add(2))
                .add_edge("a", END)
                .set_entry_point("a");
            g
        };
        let fan_out = {
            let mut g = StateGraph::<i64>::new();
            g.add_node("a", add(1))
                .add_node("b", add(1))
                .add_edge("a", "b")
                .add_edge("a", END)
                .add_edge("b", END)
                .set_entry_point("a");
            g
        };
        let dangling = {
            let mut g = StateGraph::<i64>::new();
            g.add_node("a", add(1)).set_entry_point("a");
            g
        };

        for (graph, needle) in [
            (no_entry, "no entry point"),
            (unknown_target, "unknown node 'b'"),
            (duplicate, "defined twice"),
            (fan_out, "more than one outgoing edge"),
            (dangling, "no outgoing edge"),
        ] {
            match graph.compile() {
                Err(CleanError::Graph { message }) => {
                    assert!(message.contains(needle), "{message} / {needle}")
                }
                Err(other) => panic!("unexpected error: {other:?}"),
                Ok(_) => panic!("expected compile error containing '{needle}'"),
            }
        }
    }
}
