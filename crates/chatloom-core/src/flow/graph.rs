//! Flow graph builder and compiled flow.
//!
//! Flows are declared as named nodes plus edges between them, with the
//! `START` and `END` sentinels marking entry and exit. `compile` validates
//! the declaration with `petgraph` and flattens it into the execution order.
//! Every supported flow is a linear chain: one entry edge, one outgoing edge
//! per node, no cycles, and every node on the path from `START` to `END`.

use std::collections::{HashMap, HashSet};

use chatloom_types::chat::ConversationState;
use chatloom_types::error::FlowError;
use chatloom_types::llm::LlmError;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::debug;

use super::node::FlowNode;
use crate::llm::generator::ResponseGenerator;

/// Entry sentinel.
pub const START: &str = "__start__";
/// Exit sentinel.
pub const END: &str = "__end__";

/// Declarative flow definition; call [`FlowBuilder::compile`] to validate it.
#[derive(Debug, Default)]
pub struct FlowBuilder {
    name: String,
    nodes: Vec<(String, FlowNode)>,
    edges: Vec<(String, String)>,
}

impl FlowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_node(mut self, name: impl Into<String>, node: FlowNode) -> Self {
        self.nodes.push((name.into(), node));
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    /// Validate the graph and produce its execution order.
    pub fn compile(self) -> Result<CompiledFlow, FlowError> {
        let mut seen = HashSet::new();
        for (name, _) in &self.nodes {
            if name == START || name == END || !seen.insert(name.as_str()) {
                return Err(FlowError::DuplicateNode(name.clone()));
            }
        }

        // Node 0 is START, node 1 is END, declared nodes follow.
        let mut graph = DiGraph::<&str, ()>::new();
        let start = graph.add_node(START);
        let end = graph.add_node(END);
        let mut index = HashMap::new();
        for (name, _) in &self.nodes {
            index.insert(name.as_str(), graph.add_node(name.as_str()));
        }

        let mut next: HashMap<&str, &str> = HashMap::new();
        let mut entry_count = 0;
        for (from, to) in &self.edges {
            let from_idx = if from == START {
                start
            } else {
                *index
                    .get(from.as_str())
                    .ok_or_else(|| FlowError::UnknownNode(from.clone()))?
            };
            let to_idx = if to == END {
                end
            } else {
                *index
                    .get(to.as_str())
                    .ok_or_else(|| FlowError::UnknownNode(to.clone()))?
            };

            if from == START {
                entry_count += 1;
            } else if next.insert(from.as_str(), to.as_str()).is_some() {
                return Err(FlowError::BranchingNode(from.clone()));
            }
            graph.add_edge(from_idx, to_idx, ());
        }

        match entry_count {
            0 => return Err(FlowError::MissingEntry),
            1 => {}
            _ => return Err(FlowError::MultipleEntries),
        }

        if let Some((name, _)) = self.nodes.iter().find(|(n, _)| !next.contains_key(n.as_str())) {
            return Err(FlowError::BranchingNode(name.clone()));
        }

        toposort(&graph, None).map_err(|cycle| {
            FlowError::CycleDetected(graph[cycle.node_id()].to_string())
        })?;

        // Walk the single path from START; acyclic plus one out-edge per node
        // guarantees it terminates at END.
        let entry = self
            .edges
            .iter()
            .find(|(from, _)| from == START)
            .map(|(_, to)| to.as_str())
            .ok_or(FlowError::MissingEntry)?;

        let mut order: Vec<&str> = Vec::with_capacity(self.nodes.len());
        let mut cursor = entry;
        while cursor != END {
            order.push(cursor);
            cursor = next.get(cursor).copied().ok_or_else(|| FlowError::BranchingNode(cursor.to_string()))?;
        }

        if let Some((name, _)) = self
            .nodes
            .iter()
            .find(|(n, _)| !order.contains(&n.as_str()))
        {
            return Err(FlowError::Unreachable(name.clone()));
        }

        let order: Vec<String> = order.into_iter().map(str::to_string).collect();
        let mut nodes: HashMap<String, FlowNode> = self.nodes.into_iter().collect();
        let steps = order
            .into_iter()
            .filter_map(|name| nodes.remove(&name).map(|node| (name, node)))
            .collect();

        Ok(CompiledFlow {
            name: self.name,
            steps,
        })
    }
}

/// A validated flow, ready to run.
#[derive(Debug, Clone)]
pub struct CompiledFlow {
    name: String,
    steps: Vec<(String, FlowNode)>,
}

impl CompiledFlow {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node names in execution order.
    pub fn node_names(&self) -> Vec<&str> {
        self.steps.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Execute every node in order, appending each node's output to `state`.
    ///
    /// On error the partially updated state is dropped; the caller's last
    /// checkpoint remains the resume point.
    pub async fn run(
        &self,
        mut state: ConversationState,
        generator: &ResponseGenerator,
    ) -> Result<ConversationState, LlmError> {
        for (name, node) in &self.steps {
            let produced = node.run(&state, generator).await?;
            debug!(flow = %self.name, node = %name, kind = node.kind(), appended = produced.len(), "Flow node finished");
            state.append(produced);
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{echo_generator, failing_generator};
    use chatloom_types::chat::ChatMode;
    use chatloom_types::llm::Message;

    fn intake_fixed() -> FlowBuilder {
        FlowBuilder::new("test")
            .add_node("intake", FlowNode::Intake)
            .add_node(
                "reply",
                FlowNode::Fixed {
                    reply: "ok".to_string(),
                },
            )
    }

    #[test]
    fn test_compile_linear_chain() {
        let flow = intake_fixed()
            .add_edge(START, "intake")
            .add_edge("intake", "reply")
            .add_edge("reply", END)
            .compile()
            .unwrap();

        assert_eq!(flow.name(), "test");
        assert_eq!(flow.node_names(), vec!["intake", "reply"]);
    }

    #[test]
    fn test_compile_order_follows_edges_not_declaration() {
        let flow = FlowBuilder::new("reordered")
            .add_node("b", FlowNode::Fixed { reply: "b".to_string() })
            .add_node("a", FlowNode::Intake)
            .add_edge("b", END)
            .add_edge("a", "b")
            .add_edge(START, "a")
            .compile()
            .unwrap();

        assert_eq!(flow.node_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_compile_rejects_missing_entry() {
        let err = intake_fixed()
            .add_edge("intake", "reply")
            .add_edge("reply", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingEntry));
    }

    #[test]
    fn test_compile_rejects_multiple_entries() {
        let err = intake_fixed()
            .add_edge(START, "intake")
            .add_edge(START, "reply")
            .add_edge("intake", END)
            .add_edge("reply", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::MultipleEntries));
    }

    #[test]
    fn test_compile_rejects_unknown_node() {
        let err = intake_fixed()
            .add_edge(START, "intake")
            .add_edge("intake", "missing")
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::UnknownNode(ref n) if n == "missing"));
    }

    #[test]
    fn test_compile_rejects_duplicate_node() {
        let err = FlowBuilder::new("dup")
            .add_node("intake", FlowNode::Intake)
            .add_node("intake", FlowNode::Intake)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::DuplicateNode(_)));
    }

    #[test]
    fn test_compile_rejects_branching() {
        let err = intake_fixed()
            .add_edge(START, "intake")
            .add_edge("intake", "reply")
            .add_edge("intake", END)
            .add_edge("reply", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::BranchingNode(ref n) if n == "intake"));
    }

    #[test]
    fn test_compile_rejects_dead_end_node() {
        let err = intake_fixed()
            .add_edge(START, "intake")
            .add_edge("intake", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::BranchingNode(ref n) if n == "reply"));
    }

    #[test]
    fn test_compile_rejects_cycle() {
        let err = FlowBuilder::new("loop")
            .add_node("a", FlowNode::Intake)
            .add_node("b", FlowNode::Intake)
            .add_node("c", FlowNode::Intake)
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge("b", "c")
            .add_edge("c", "b")
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::CycleDetected(_)));
    }

    #[test]
    fn test_compile_rejects_unreachable_node() {
        let err = FlowBuilder::new("island")
            .add_node("a", FlowNode::Intake)
            .add_node("b", FlowNode::Intake)
            .add_edge(START, "a")
            .add_edge("a", END)
            .add_edge("b", END)
            .compile()
            .unwrap_err();
        assert!(matches!(err, FlowError::Unreachable(ref n) if n == "b"));
    }

    #[tokio::test]
    async fn test_run_appends_in_node_order() {
        let flow = FlowBuilder::new("qna")
            .add_node("intake", FlowNode::Intake)
            .add_node("generate", FlowNode::Generate { system_prompt: None })
            .add_edge(START, "intake")
            .add_edge("intake", "generate")
            .add_edge("generate", END)
            .compile()
            .unwrap();

        let mut state = ConversationState::new(ChatMode::Qna);
        state.last_human_message = "Hello".to_string();
        let state = flow.run(state, &echo_generator()).await.unwrap();

        assert_eq!(
            state.messages,
            vec![Message::human("Hello"), Message::assistant("echo: Hello")]
        );
    }

    #[tokio::test]
    async fn test_run_stops_at_failing_node() {
        let flow = FlowBuilder::new("qna")
            .add_node("intake", FlowNode::Intake)
            .add_node("generate", FlowNode::Generate { system_prompt: None })
            .add_edge(START, "intake")
            .add_edge("intake", "generate")
            .add_edge("generate", END)
            .compile()
            .unwrap();

        let mut state = ConversationState::new(ChatMode::Qna);
        state.last_human_message = "Hello".to_string();
        let result = flow.run(state, &failing_generator()).await;

        assert!(result.is_err());
    }
}
