//! GraphIR: nodes, edges, and the validated graph container
//!
//! GraphIR is the flat directed graph the orchestration engine executes.
//! It is produced by the compiler (or assembled directly for testing) and
//! is immutable once constructed. Validation here is a structural contract
//! only: ids are unique, endpoints exist, entry/exit are real nodes. Graph
//! traversal semantics (reachability, cycle legality for loop back-edges)
//! are the producer's responsibility, not this model's.
//!
//! Persisted as JSON. Optional fields serialize explicitly (`null`) and
//! `meta` is always present, so canonical dumps round-trip byte-for-byte.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Unique identifier for a node within one graph.
pub type NodeId = String;

/// Open string-keyed annotation mapping for engine/tooling use.
pub type Meta = serde_json::Map<String, serde_json::Value>;

fn ident(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GraphError::EmptyIdentifier { field });
    }
    Ok(trimmed.to_string())
}

/// The kind of a graph node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeKind {
    /// Global entry point, synthesized by the compiler. One per graph.
    Entry,
    /// Global exit point, synthesized by the compiler. One per graph.
    Exit,
    /// Executes a task template resolved by `task_id`.
    Task,
    /// Guarded branching point (choice cases, loop condition).
    Decision,
    /// Convergence point closing a decision or loop region.
    Merge,
    /// Parallel fan-out.
    Fork,
    /// Parallel fan-in; carries the join discipline in `meta`.
    Join,
}

/// One node in the compiled workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNode")]
pub struct Node {
    node_id: NodeId,
    kind: NodeKind,
    task_id: Option<String>,
    guard: Option<String>,
    meta: Meta,
}

impl Node {
    /// Create a non-TASK node.
    ///
    /// Fails for [`NodeKind::Task`]; task nodes must name a task template,
    /// use [`Node::task`] instead.
    pub fn new(node_id: impl Into<String>, kind: NodeKind) -> Result<Self> {
        let node_id = ident("Node.node_id", node_id.into())?;
        if kind == NodeKind::Task {
            return Err(GraphError::MissingTaskId { node_id });
        }
        Ok(Self {
            node_id,
            kind,
            task_id: None,
            guard: None,
            meta: Meta::new(),
        })
    }

    /// Create a TASK node referencing a task template.
    pub fn task(node_id: impl Into<String>, task_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: ident("Node.node_id", node_id.into())?,
            kind: NodeKind::Task,
            task_id: Some(ident("Node.task_id", task_id.into())?),
            guard: None,
            meta: Meta::new(),
        })
    }

    /// Attach an opaque predicate reference.
    pub fn with_guard(self, guard: impl Into<String>) -> Result<Self> {
        Ok(Self {
            guard: Some(ident("Node.guard", guard.into())?),
            ..self
        })
    }

    /// Attach one meta annotation.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    node_id: String,
    kind: NodeKind,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    guard: Option<String>,
    #[serde(default)]
    meta: Meta,
}

impl TryFrom<RawNode> for Node {
    type Error = GraphError;

    fn try_from(raw: RawNode) -> Result<Self> {
        let node_id = ident("Node.node_id", raw.node_id)?;
        let task_id = raw
            .task_id
            .map(|t| ident("Node.task_id", t))
            .transpose()?;
        match (raw.kind, &task_id) {
            (NodeKind::Task, None) => return Err(GraphError::MissingTaskId { node_id }),
            (NodeKind::Task, Some(_)) => {}
            (_, Some(_)) => return Err(GraphError::UnexpectedTaskId { node_id }),
            (_, None) => {}
        }
        Ok(Self {
            node_id,
            kind: raw.kind,
            task_id,
            guard: raw.guard.map(|g| ident("Node.guard", g)).transpose()?,
            meta: raw.meta,
        })
    }
}

/// Directed edge between two nodes.
///
/// `label` is a stable human-readable discriminator (branch/case name);
/// `guard` an opaque predicate reference the engine evaluates before
/// taking the edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEdge")]
pub struct Edge {
    src: NodeId,
    dst: NodeId,
    label: Option<String>,
    guard: Option<String>,
    meta: Meta,
}

impl Edge {
    /// Create an unlabeled, unguarded edge.
    pub fn new(src: impl Into<String>, dst: impl Into<String>) -> Result<Self> {
        Ok(Self {
            src: ident("Edge.src", src.into())?,
            dst: ident("Edge.dst", dst.into())?,
            label: None,
            guard: None,
            meta: Meta::new(),
        })
    }

    /// Attach a discriminator label.
    pub fn with_label(self, label: impl Into<String>) -> Result<Self> {
        Ok(Self {
            label: Some(ident("Edge.label", label.into())?),
            ..self
        })
    }

    /// Attach an opaque predicate reference.
    pub fn with_guard(self, guard: impl Into<String>) -> Result<Self> {
        Ok(Self {
            guard: Some(ident("Edge.guard", guard.into())?),
            ..self
        })
    }

    /// Attach one meta annotation.
    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEdge {
    src: String,
    dst: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    guard: Option<String>,
    #[serde(default)]
    meta: Meta,
}

impl TryFrom<RawEdge> for Edge {
    type Error = GraphError;

    fn try_from(raw: RawEdge) -> Result<Self> {
        Ok(Self {
            src: ident("Edge.src", raw.src)?,
            dst: ident("Edge.dst", raw.dst)?,
            label: raw.label.map(|l| ident("Edge.label", l)).transpose()?,
            guard: raw.guard.map(|g| ident("Edge.guard", g)).transpose()?,
            meta: raw.meta,
        })
    }
}

/// Graph Intermediate Representation.
///
/// `entry_id` and `exit_id` define the single-entry/single-exit interface
/// of the compiled workflow as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGraphIr")]
pub struct GraphIr {
    graph_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    entry_id: NodeId,
    exit_id: NodeId,
}

impl GraphIr {
    /// Assemble and validate a graph.
    ///
    /// Checks, in order: node id uniqueness, edge endpoint existence,
    /// duplicate `(src, dst, label)` triples, entry/exit existence. The
    /// TASK ⇔ task_id invariant is enforced by [`Node`] construction,
    /// which every contained node has already passed.
    pub fn new(
        graph_id: impl Into<String>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        entry_id: impl Into<String>,
        exit_id: impl Into<String>,
    ) -> Result<Self> {
        let graph_id = ident("GraphIr.graph_id", graph_id.into())?;
        let entry_id = ident("GraphIr.entry_id", entry_id.into())?;
        let exit_id = ident("GraphIr.exit_id", exit_id.into())?;

        let mut node_ids: HashSet<&str> = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !node_ids.insert(node.node_id()) {
                return Err(GraphError::DuplicateNodeId {
                    node_id: node.node_id().to_string(),
                });
            }
        }

        let mut seen_edges: HashSet<(&str, &str, Option<&str>)> =
            HashSet::with_capacity(edges.len());
        for edge in &edges {
            for endpoint in [edge.src(), edge.dst()] {
                if !node_ids.contains(endpoint) {
                    return Err(GraphError::UnknownEdgeEndpoint {
                        src: edge.src().to_string(),
                        dst: edge.dst().to_string(),
                        node_id: endpoint.to_string(),
                    });
                }
            }
            if !seen_edges.insert((edge.src(), edge.dst(), edge.label())) {
                return Err(GraphError::DuplicateEdge {
                    src: edge.src().to_string(),
                    dst: edge.dst().to_string(),
                    label: edge.label().map(str::to_string),
                });
            }
        }

        if !node_ids.contains(entry_id.as_str()) {
            return Err(GraphError::EntryNotFound { node_id: entry_id });
        }
        if !node_ids.contains(exit_id.as_str()) {
            return Err(GraphError::ExitNotFound { node_id: exit_id });
        }

        Ok(Self {
            graph_id,
            nodes,
            edges,
            entry_id,
            exit_id,
        })
    }

    pub fn graph_id(&self) -> &str {
        &self.graph_id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn entry_id(&self) -> &str {
        &self.entry_id
    }

    pub fn exit_id(&self) -> &str {
        &self.exit_id
    }

    /// Find a node by id.
    pub fn find_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.node_id() == node_id)
    }

    /// Edges entering a node.
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.dst() == node_id)
    }

    /// Edges leaving a node.
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.src() == node_id)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGraphIr {
    graph_id: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    entry_id: String,
    exit_id: String,
}

impl TryFrom<RawGraphIr> for GraphIr {
    type Error = GraphError;

    fn try_from(raw: RawGraphIr) -> Result<Self> {
        GraphIr::new(raw.graph_id, raw.nodes, raw.edges, raw.entry_id, raw.exit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_node_graph() -> GraphIr {
        GraphIr::new(
            "demo",
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::task("n1", "ingest").unwrap(),
                Node::new("n2", NodeKind::Exit).unwrap(),
            ],
            vec![
                Edge::new("n0", "n1").unwrap(),
                Edge::new("n1", "n2").unwrap(),
            ],
            "n0",
            "n2",
        )
        .unwrap()
    }

    #[test]
    fn test_task_node_requires_task_id() {
        let err = Node::new("n1", NodeKind::Task).unwrap_err();
        assert!(matches!(err, GraphError::MissingTaskId { node_id } if node_id == "n1"));
    }

    #[test]
    fn test_non_task_node_rejects_task_id_on_load() {
        let result = serde_json::from_value::<Node>(serde_json::json!({
            "node_id": "n0",
            "kind": "MERGE",
            "task_id": "oops",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_node_ids() {
        let err = GraphIr::new(
            "bad",
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::new("n0", NodeKind::Exit).unwrap(),
            ],
            vec![],
            "n0",
            "n0",
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNodeId { node_id } if node_id == "n0"));
    }

    #[test]
    fn test_rejects_unknown_edge_endpoint() {
        let err = GraphIr::new(
            "bad",
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::new("n1", NodeKind::Exit).unwrap(),
            ],
            vec![Edge::new("n0", "nX").unwrap()],
            "n0",
            "n1",
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnknownEdgeEndpoint { node_id, .. } if node_id == "nX"));
    }

    #[test]
    fn test_rejects_duplicate_edge_triple() {
        let err = GraphIr::new(
            "bad",
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::new("n1", NodeKind::Exit).unwrap(),
            ],
            vec![
                Edge::new("n0", "n1").unwrap().with_label("x").unwrap(),
                Edge::new("n0", "n1").unwrap().with_label("x").unwrap(),
            ],
            "n0",
            "n1",
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));
    }

    #[test]
    fn test_same_endpoints_different_labels_allowed() {
        let g = GraphIr::new(
            "ok",
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::new("n1", NodeKind::Exit).unwrap(),
            ],
            vec![
                Edge::new("n0", "n1").unwrap().with_label("a").unwrap(),
                Edge::new("n0", "n1").unwrap().with_label("b").unwrap(),
            ],
            "n0",
            "n1",
        );
        assert!(g.is_ok());
    }

    #[test]
    fn test_rejects_missing_entry_and_exit() {
        let nodes = || {
            vec![
                Node::new("n0", NodeKind::Entry).unwrap(),
                Node::new("n1", NodeKind::Exit).unwrap(),
            ]
        };
        let err = GraphIr::new("bad", nodes(), vec![], "missing", "n1").unwrap_err();
        assert!(matches!(err, GraphError::EntryNotFound { .. }));

        let err = GraphIr::new("bad", nodes(), vec![], "n0", "missing").unwrap_err();
        assert!(matches!(err, GraphError::ExitNotFound { .. }));
    }

    #[test]
    fn test_canonical_dump_is_explicit() {
        let g = three_node_graph();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "graph_id": "demo",
                "nodes": [
                    {"node_id": "n0", "kind": "ENTRY", "task_id": null, "guard": null, "meta": {}},
                    {"node_id": "n1", "kind": "TASK", "task_id": "ingest", "guard": null, "meta": {}},
                    {"node_id": "n2", "kind": "EXIT", "task_id": null, "guard": null, "meta": {}},
                ],
                "edges": [
                    {"src": "n0", "dst": "n1", "label": null, "guard": null, "meta": {}},
                    {"src": "n1", "dst": "n2", "label": null, "guard": null, "meta": {}},
                ],
                "entry_id": "n0",
                "exit_id": "n2",
            })
        );
    }

    #[test]
    fn test_json_roundtrip_byte_for_byte() {
        let g = three_node_graph();
        let first = serde_json::to_string(&g).unwrap();
        let reparsed: GraphIr = serde_json::from_str(&first).unwrap();
        let second = serde_json::to_string(&reparsed).unwrap();
        assert_eq!(first, second);
        assert_eq!(reparsed, g);
    }

    #[test]
    fn test_load_rejects_invalid_graph() {
        let result = serde_json::from_value::<GraphIr>(serde_json::json!({
            "graph_id": "bad",
            "nodes": [
                {"node_id": "n0", "kind": "ENTRY"},
                {"node_id": "n1", "kind": "EXIT"},
            ],
            "edges": [{"src": "n0", "dst": "nX"}],
            "entry_id": "n0",
            "exit_id": "n1",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_accessors() {
        let g = three_node_graph();
        assert_eq!(g.find_node("n1").unwrap().task_id(), Some("ingest"));
        assert_eq!(g.outgoing_edges("n0").count(), 1);
        assert_eq!(g.incoming_edges("n2").count(), 1);
    }
}
