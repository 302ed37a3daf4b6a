//! Recursive SESE lowering from specification trees to GraphIR
//!
//! Every block kind lowers to a region with exactly one entry and one exit
//! node, so arbitrary well-formed nestings compose into one coherent graph:
//!
//! - task_ref: one TASK node (entry = exit)
//! - sequence: children chained exit-to-entry
//! - choice: DECISION fan-out to case bodies, MERGE fan-in
//! - parallel: FORK fan-out, JOIN fan-in carrying the join discipline
//! - loop: DECISION with a guarded continue edge, a back-edge from the
//!   body, and an exit edge to a MERGE
//! - composite: transparent passthrough of the body's region
//!
//! The pass is single-threaded and pure; the only state is the id counter
//! and the accumulating node/edge vectors, all owned by one call. The
//! assembled graph goes through full `GraphIr` validation before being
//! returned, as the final acceptance gate.

use std::collections::BTreeMap;

use log::{debug, trace};

use weave_ir::{Edge, GraphIr, Node, NodeKind};
use weave_spec::{
    Block, ChoiceBlock, CompositeBlock, JoinMode, LoopBlock, ParallelBlock, SequenceBlock,
    TaskReference,
};

use crate::error::Result;
use crate::idgen::IdGen;
use crate::options::CompileOptions;

/// Meta key on JOIN nodes recording the join discipline (`"AND"`/`"OR"`).
pub const META_JOIN: &str = "join";

/// Meta key on loop DECISION nodes recording the engine-enforced
/// iteration bound.
pub const META_MAX_ITERS: &str = "max_iters";

/// Composite provenance side table.
///
/// Maps a compiled region's `(entry_id, exit_id)` pair to the composite
/// name that wrapped it. Purely diagnostic: composites are transparent in
/// the graph, and the engine never consults this.
pub type CompositeProvenance = BTreeMap<(String, String), String>;

/// SESE interface of a compiled sub-tree: control enters the region only
/// at `entry_id` and leaves only at `exit_id`. Exists only during
/// compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Region {
    entry_id: String,
    exit_id: String,
}

/// Compile a specification tree into a validated [`GraphIr`].
pub fn compile(spec: &Block, options: &CompileOptions) -> Result<GraphIr> {
    compile_with_provenance(spec, options).map(|(graph, _)| graph)
}

/// Compile, also returning the composite provenance side table.
pub fn compile_with_provenance(
    spec: &Block,
    options: &CompileOptions,
) -> Result<(GraphIr, CompositeProvenance)> {
    let mut lowering = Lowering::new(options);

    // Global ENTRY and EXIT are allocated first so their ids are stable
    // regardless of tree shape.
    let entry_id = lowering.ids.next_id();
    let exit_id = lowering.ids.next_id();
    lowering.nodes.push(Node::new(&entry_id, NodeKind::Entry)?);
    lowering.nodes.push(Node::new(&exit_id, NodeKind::Exit)?);

    let tree = lowering.lower_block(spec)?;
    lowering.edges.push(Edge::new(&entry_id, &tree.entry_id)?);
    lowering.edges.push(Edge::new(&tree.exit_id, &exit_id)?);

    let graph = GraphIr::new(
        options.graph_id.clone(),
        lowering.nodes,
        lowering.edges,
        entry_id,
        exit_id,
    )?;
    debug!(
        "compiled graph '{}': {} nodes, {} edges",
        graph.graph_id(),
        graph.nodes().len(),
        graph.edges().len()
    );
    Ok((graph, lowering.composites))
}

/// Per-call lowering state: the id counter and the accumulating
/// node/edge collections.
struct Lowering<'a> {
    opts: &'a CompileOptions,
    ids: IdGen,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    composites: CompositeProvenance,
}

impl<'a> Lowering<'a> {
    fn new(opts: &'a CompileOptions) -> Self {
        Self {
            opts,
            ids: IdGen::new(&opts.node_id_prefix),
            nodes: Vec::new(),
            edges: Vec::new(),
            composites: CompositeProvenance::new(),
        }
    }

    /// Lowering dispatch. Exhaustive over the closed block union, so a new
    /// block kind fails compilation of this crate until a rule exists.
    fn lower_block(&mut self, block: &Block) -> Result<Region> {
        trace!("lowering {} block", block.kind());
        match block {
            Block::TaskRef(b) => self.lower_task_ref(b),
            Block::Sequence(b) => self.lower_sequence(b),
            Block::Choice(b) => self.lower_choice(b),
            Block::Parallel(b) => self.lower_parallel(b),
            Block::Loop(b) => self.lower_loop(b),
            Block::Composite(b) => self.lower_composite(b),
        }
    }

    /// One TASK node; the region's entry and exit coincide.
    fn lower_task_ref(&mut self, task: &TaskReference) -> Result<Region> {
        let node_id = match (self.opts.preserve_spec_node_ids, task.node_id()) {
            (true, Some(id)) => id.to_string(),
            _ => self.ids.next_id(),
        };
        self.nodes.push(Node::task(&node_id, task.task_id())?);
        Ok(Region {
            entry_id: node_id.clone(),
            exit_id: node_id,
        })
    }

    /// Chain child regions: child[i].exit -> child[i+1].entry.
    fn lower_sequence(&mut self, seq: &SequenceBlock) -> Result<Region> {
        let mut regions = Vec::with_capacity(seq.items().len());
        for item in seq.items() {
            regions.push(self.lower_block(item)?);
        }
        for pair in regions.windows(2) {
            self.edges
                .push(Edge::new(&pair[0].exit_id, &pair[1].entry_id)?);
        }
        // items is validated non-empty at the specification layer.
        Ok(Region {
            entry_id: regions[0].entry_id.clone(),
            exit_id: regions[regions.len() - 1].exit_id.clone(),
        })
    }

    /// DECISION fan-out over cases, MERGE fan-in.
    ///
    /// Case edges carry the case label and its guard; a default edge
    /// carries the label `"default"` and no guard. Without a default there
    /// is deliberately no fallthrough edge: what the engine does when no
    /// case matches is its own policy decision.
    fn lower_choice(&mut self, choice: &ChoiceBlock) -> Result<Region> {
        let decision_id = self.ids.next_id();
        let merge_id = self.ids.next_id();
        self.nodes.push(Node::new(&decision_id, NodeKind::Decision)?);
        self.nodes.push(Node::new(&merge_id, NodeKind::Merge)?);

        for case in choice.cases() {
            let body = self.lower_block(case.body())?;
            let mut edge = Edge::new(&decision_id, &body.entry_id)?.with_label(case.label())?;
            if let Some(guard) = case.guard() {
                edge = edge.with_guard(guard)?;
            }
            self.edges.push(edge);
            self.edges.push(Edge::new(&body.exit_id, &merge_id)?);
        }

        if let Some(default) = choice.default_case() {
            let body = self.lower_block(default)?;
            self.edges
                .push(Edge::new(&decision_id, &body.entry_id)?.with_label("default")?);
            self.edges.push(Edge::new(&body.exit_id, &merge_id)?);
        }

        Ok(Region {
            entry_id: decision_id,
            exit_id: merge_id,
        })
    }

    /// FORK fan-out over branches, JOIN fan-in.
    ///
    /// The JOIN node records the block's join discipline in `meta`; how an
    /// OR-join disposes of losing branches is the engine's policy.
    fn lower_parallel(&mut self, parallel: &ParallelBlock) -> Result<Region> {
        let fork_id = self.ids.next_id();
        let join_id = self.ids.next_id();
        self.nodes.push(Node::new(&fork_id, NodeKind::Fork)?);
        self.nodes.push(
            Node::new(&join_id, NodeKind::Join)?
                .with_meta(META_JOIN, join_mode_value(parallel.join())),
        );

        for branch in parallel.branches() {
            let body = self.lower_block(branch.body())?;
            self.edges
                .push(Edge::new(&fork_id, &body.entry_id)?.with_label(branch.label())?);
            self.edges.push(Edge::new(&body.exit_id, &join_id)?);
        }

        Ok(Region {
            entry_id: fork_id,
            exit_id: join_id,
        })
    }

    /// DECISION entry, MERGE exit, body between them.
    ///
    /// The guarded `"continue"` edge is taken while the guard holds; the
    /// `"repeat"` back-edge returns from the body to the DECISION; the
    /// unguarded `"exit"` edge leads to the MERGE. `max_iters` cannot be a
    /// graph shape (the back-edge is unbounded structurally), so it rides
    /// on the DECISION node's `meta` for the engine to enforce.
    fn lower_loop(&mut self, looped: &LoopBlock) -> Result<Region> {
        let decision_id = self.ids.next_id();
        let merge_id = self.ids.next_id();

        let mut decision = Node::new(&decision_id, NodeKind::Decision)?;
        if let Some(bound) = looped.max_iters() {
            decision = decision.with_meta(META_MAX_ITERS, bound.into());
        }
        self.nodes.push(decision);
        self.nodes.push(Node::new(&merge_id, NodeKind::Merge)?);

        let body = self.lower_block(looped.body())?;
        self.edges.push(
            Edge::new(&decision_id, &body.entry_id)?
                .with_label("continue")?
                .with_guard(looped.guard())?,
        );
        self.edges
            .push(Edge::new(&body.exit_id, &decision_id)?.with_label("repeat")?);
        self.edges
            .push(Edge::new(&decision_id, &merge_id)?.with_label("exit")?);

        Ok(Region {
            entry_id: decision_id,
            exit_id: merge_id,
        })
    }

    /// Transparent passthrough; only the provenance table learns the name.
    ///
    /// Nested composites around the same region keep the outermost name.
    fn lower_composite(&mut self, composite: &CompositeBlock) -> Result<Region> {
        let region = self.lower_block(composite.body())?;
        self.composites.insert(
            (region.entry_id.clone(), region.exit_id.clone()),
            composite.name().to_string(),
        );
        Ok(region)
    }
}

fn join_mode_value(join: JoinMode) -> serde_json::Value {
    match join {
        JoinMode::And => "AND".into(),
        JoinMode::Or => "OR".into(),
    }
}
