//! Fluent builder for hand-assembled graphs
//!
//! Mostly a test and tooling convenience: `build()` funnels through
//! [`GraphIr::new`], so a hand-built graph faces exactly the validation the
//! compiler's output does.

use crate::error::{GraphError, Result};
use crate::graph::{Edge, GraphIr, Node, NodeKind};

/// Fluent builder for [`GraphIr`]
///
/// The first construction error encountered is held and returned from
/// [`GraphIrBuilder::build`], so chains stay uninterrupted.
///
/// # Example
///
/// ```
/// use weave_ir::GraphIrBuilder;
///
/// let graph = GraphIrBuilder::new("demo")
///     .entry("n0")
///     .task("n1", "ingest")
///     .exit("n2")
///     .edge("n0", "n1")
///     .edge("n1", "n2")
///     .build()?;
/// assert_eq!(graph.nodes().len(), 3);
/// # Ok::<(), weave_ir::GraphError>(())
/// ```
pub struct GraphIrBuilder {
    graph_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    entry_id: Option<String>,
    exit_id: Option<String>,
    deferred: Option<GraphError>,
}

impl GraphIrBuilder {
    /// Start a builder for a graph with the given id.
    pub fn new(graph_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            entry_id: None,
            exit_id: None,
            deferred: None,
        }
    }

    fn push_node(&mut self, node: Result<Node>) {
        match node {
            Ok(node) => self.nodes.push(node),
            Err(err) => {
                self.deferred.get_or_insert(err);
            }
        }
    }

    fn push_edge(&mut self, edge: Result<Edge>) {
        match edge {
            Ok(edge) => self.edges.push(edge),
            Err(err) => {
                self.deferred.get_or_insert(err);
            }
        }
    }

    /// Add the ENTRY node and record it as the graph entry.
    pub fn entry(mut self, node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        self.entry_id = Some(node_id.clone());
        self.push_node(Node::new(node_id, NodeKind::Entry));
        self
    }

    /// Add the EXIT node and record it as the graph exit.
    pub fn exit(mut self, node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        self.exit_id = Some(node_id.clone());
        self.push_node(Node::new(node_id, NodeKind::Exit));
        self
    }

    /// Add a TASK node.
    pub fn task(mut self, node_id: impl Into<String>, task_id: impl Into<String>) -> Self {
        self.push_node(Node::task(node_id, task_id));
        self
    }

    /// Add a non-TASK node of the given kind.
    pub fn node(mut self, node_id: impl Into<String>, kind: NodeKind) -> Self {
        self.push_node(Node::new(node_id, kind));
        self
    }

    /// Add a pre-constructed node.
    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an unlabeled edge.
    pub fn edge(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.push_edge(Edge::new(src, dst));
        self
    }

    /// Add a labeled edge.
    pub fn labeled_edge(
        mut self,
        src: impl Into<String>,
        dst: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        self.push_edge(Edge::new(src, dst).and_then(|e| e.with_label(label)));
        self
    }

    /// Add a pre-constructed edge.
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Assemble and validate.
    ///
    /// Entry/exit default to empty ids (and fail validation) when `entry`
    /// / `exit` were never called.
    pub fn build(self) -> Result<GraphIr> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        GraphIr::new(
            self.graph_id,
            self.nodes,
            self.edges,
            self.entry_id.unwrap_or_default(),
            self.exit_id.unwrap_or_default(),
        )
    }
}
