//! Specification AST: structured control flow over opaque task references
//!
//! These types are the authoring surface for workflows. They form an
//! immutable tree of blocks (sequence, choice, parallel, loop, composite)
//! whose leaves name task templates by id. Every structural constraint is
//! enforced at construction; a `Block` value in hand is always valid.
//!
//! The tree is persisted as JSON with a `kind` discriminator per block.
//! Unknown fields are rejected on load to keep the contract closed, and
//! optional fields serialize explicitly (as `null`) so dumps are stable
//! across versions and diffs.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecError};

/// Trim an identifier-like string, rejecting empty values.
fn ident(block: &'static str, field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(SpecError::EmptyIdentifier { block, field });
    }
    Ok(trimmed.to_string())
}

/// Same as [`ident`] but for optional fields.
fn ident_opt(
    block: &'static str,
    field: &'static str,
    value: Option<String>,
) -> Result<Option<String>> {
    value.map(|v| ident(block, field, v)).transpose()
}

/// Join discipline for a [`ParallelBlock`].
///
/// Records *intent* only. How an OR-join disposes of losing branches
/// (cancel, or let them finish and ignore the result) is an engine policy,
/// not part of this model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinMode {
    /// Join when all branches complete.
    #[default]
    And,
    /// Join when any one branch completes.
    Or,
}

/// One node of the specification AST.
///
/// A closed tagged union: adding a variant is a compile-time-checked change
/// everywhere blocks are matched on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Block {
    /// Leaf reference to a task template.
    #[serde(rename = "task_ref")]
    TaskRef(TaskReference),
    /// Ordered composition.
    #[serde(rename = "sequence")]
    Sequence(SequenceBlock),
    /// Guarded branching with an optional default.
    #[serde(rename = "choice")]
    Choice(ChoiceBlock),
    /// Fork/join parallelism.
    #[serde(rename = "parallel")]
    Parallel(ParallelBlock),
    /// Guarded repetition with an optional iteration bound.
    #[serde(rename = "loop")]
    Loop(LoopBlock),
    /// Named, transparent grouping.
    #[serde(rename = "composite")]
    Composite(CompositeBlock),
}

impl Block {
    /// The wire-format discriminator for this block.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::TaskRef(_) => "task_ref",
            Block::Sequence(_) => "sequence",
            Block::Choice(_) => "choice",
            Block::Parallel(_) => "parallel",
            Block::Loop(_) => "loop",
            Block::Composite(_) => "composite",
        }
    }

    /// Author-supplied stable identity, if any.
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Block::TaskRef(b) => b.node_id(),
            Block::Sequence(b) => b.node_id(),
            Block::Choice(b) => b.node_id(),
            Block::Parallel(b) => b.node_id(),
            Block::Loop(b) => b.node_id(),
            Block::Composite(b) => b.node_id(),
        }
    }
}

impl From<TaskReference> for Block {
    fn from(b: TaskReference) -> Self {
        Block::TaskRef(b)
    }
}

impl From<SequenceBlock> for Block {
    fn from(b: SequenceBlock) -> Self {
        Block::Sequence(b)
    }
}

impl From<ChoiceBlock> for Block {
    fn from(b: ChoiceBlock) -> Self {
        Block::Choice(b)
    }
}

impl From<ParallelBlock> for Block {
    fn from(b: ParallelBlock) -> Self {
        Block::Parallel(b)
    }
}

impl From<LoopBlock> for Block {
    fn from(b: LoopBlock) -> Self {
        Block::Loop(b)
    }
}

impl From<CompositeBlock> for Block {
    fn from(b: CompositeBlock) -> Self {
        Block::Composite(b)
    }
}

/// Leaf block naming a task template by id.
///
/// Represents no execution state itself; the engine resolves `task_id`
/// against its own task registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawTaskReference")]
pub struct TaskReference {
    node_id: Option<String>,
    task_id: String,
}

impl TaskReference {
    /// Create a reference to a task template.
    pub fn new(task_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: None,
            task_id: ident("TaskReference", "task_id", task_id.into())?,
        })
    }

    /// Attach an author-supplied node id for stable identity across edits.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("TaskReference", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Ordered composition of blocks. Order is semantically meaningful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawSequenceBlock")]
pub struct SequenceBlock {
    node_id: Option<String>,
    items: Vec<Block>,
}

impl SequenceBlock {
    /// Create a sequence. `items` must be non-empty.
    pub fn new(items: Vec<Block>) -> Result<Self> {
        if items.is_empty() {
            return Err(SpecError::EmptyCollection {
                block: "SequenceBlock",
                field: "items",
            });
        }
        Ok(Self {
            node_id: None,
            items,
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("SequenceBlock", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn items(&self) -> &[Block] {
        &self.items
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// One branch of a [`ChoiceBlock`].
///
/// `guard` is an opaque predicate reference resolved at runtime by the
/// engine (a registry key, expression id, etc.). A case with no guard is an
/// unconditional branch, useful for "else"-style cases inside `cases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawChoiceCase")]
pub struct ChoiceCase {
    node_id: Option<String>,
    label: String,
    guard: Option<String>,
    body: Block,
}

impl ChoiceCase {
    /// Create a case. `guard` may be `None` for an unconditional branch.
    pub fn new(
        label: impl Into<String>,
        guard: Option<String>,
        body: impl Into<Block>,
    ) -> Result<Self> {
        Ok(Self {
            node_id: None,
            label: ident("ChoiceCase", "label", label.into())?,
            guard: ident_opt("ChoiceCase", "guard", guard)?,
            body: body.into(),
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("ChoiceCase", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn guard(&self) -> Option<&str> {
        self.guard.as_deref()
    }

    pub fn body(&self) -> &Block {
        &self.body
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Guarded branching block.
///
/// If no case matches at runtime and no `default` is present, the compiled
/// graph has no edge to take; engine behavior for that situation is an
/// explicit open policy decision of the engine contract, not encoded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawChoiceBlock")]
pub struct ChoiceBlock {
    node_id: Option<String>,
    cases: Vec<ChoiceCase>,
    #[serde(rename = "default")]
    default_case: Option<Box<Block>>,
}

impl ChoiceBlock {
    /// Create a choice. `cases` must be non-empty with pairwise-unique
    /// labels. A case may not be labeled `"default"` while a default branch
    /// is present: the compiler labels the default's edge `"default"`, and
    /// the outgoing edge labels of one decision point must stay unambiguous.
    pub fn new(cases: Vec<ChoiceCase>, default_case: Option<Block>) -> Result<Self> {
        if cases.is_empty() {
            return Err(SpecError::EmptyCollection {
                block: "ChoiceBlock",
                field: "cases",
            });
        }
        check_unique_labels("ChoiceBlock.cases", cases.iter().map(|c| c.label()))?;
        if default_case.is_some() && cases.iter().any(|c| c.label() == "default") {
            return Err(SpecError::ReservedLabel {
                block: "ChoiceBlock.cases",
                label: "default".to_string(),
            });
        }
        Ok(Self {
            node_id: None,
            cases,
            default_case: default_case.map(Box::new),
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("ChoiceBlock", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn cases(&self) -> &[ChoiceCase] {
        &self.cases
    }

    pub fn default_case(&self) -> Option<&Block> {
        self.default_case.as_deref()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// One branch of a [`ParallelBlock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawParallelBranch")]
pub struct ParallelBranch {
    node_id: Option<String>,
    label: String,
    body: Block,
}

impl ParallelBranch {
    pub fn new(label: impl Into<String>, body: impl Into<Block>) -> Result<Self> {
        Ok(Self {
            node_id: None,
            label: ident("ParallelBranch", "label", label.into())?,
            body: body.into(),
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("ParallelBranch", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn body(&self) -> &Block {
        &self.body
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Parallel fork/join region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawParallelBlock")]
pub struct ParallelBlock {
    node_id: Option<String>,
    branches: Vec<ParallelBranch>,
    join: JoinMode,
}

impl ParallelBlock {
    /// Create a parallel block. `branches` must be non-empty with
    /// pairwise-unique labels.
    pub fn new(branches: Vec<ParallelBranch>, join: JoinMode) -> Result<Self> {
        if branches.is_empty() {
            return Err(SpecError::EmptyCollection {
                block: "ParallelBlock",
                field: "branches",
            });
        }
        check_unique_labels("ParallelBlock.branches", branches.iter().map(|b| b.label()))?;
        Ok(Self {
            node_id: None,
            branches,
            join,
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("ParallelBlock", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn branches(&self) -> &[ParallelBranch] {
        &self.branches
    }

    pub fn join(&self) -> JoinMode {
        self.join
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Guarded repetition block.
///
/// The body repeats while `guard` holds. `max_iters` is an engine-enforced
/// bound, recorded faithfully but not structurally expressible in a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawLoopBlock")]
pub struct LoopBlock {
    node_id: Option<String>,
    body: Box<Block>,
    guard: String,
    max_iters: Option<u32>,
}

impl LoopBlock {
    /// Create a loop. `max_iters`, when present, must be positive.
    pub fn new(
        body: impl Into<Block>,
        guard: impl Into<String>,
        max_iters: Option<u32>,
    ) -> Result<Self> {
        if max_iters == Some(0) {
            return Err(SpecError::NonPositiveMaxIters);
        }
        Ok(Self {
            node_id: None,
            body: Box::new(body.into()),
            guard: ident("LoopBlock", "guard", guard.into())?,
            max_iters,
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("LoopBlock", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn body(&self) -> &Block {
        &self.body
    }

    pub fn guard(&self) -> &str {
        &self.guard
    }

    pub fn max_iters(&self) -> Option<u32> {
        self.max_iters
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Named, transparent grouping boundary.
///
/// A composite has no independent runtime behavior; the name exists for
/// authors and tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "raw::RawCompositeBlock")]
pub struct CompositeBlock {
    node_id: Option<String>,
    name: String,
    body: Box<Block>,
}

impl CompositeBlock {
    pub fn new(name: impl Into<String>, body: impl Into<Block>) -> Result<Self> {
        Ok(Self {
            node_id: None,
            name: ident("CompositeBlock", "name", name.into())?,
            body: Box::new(body.into()),
        })
    }

    /// Attach an author-supplied node id.
    pub fn with_node_id(self, node_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            node_id: Some(ident("CompositeBlock", "node_id", node_id.into())?),
            ..self
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &Block {
        &self.body
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }
}

/// Reject duplicate labels within one block's cases/branches.
fn check_unique_labels<'a>(
    block: &'static str,
    labels: impl Iterator<Item = &'a str>,
) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for label in labels {
        if !seen.insert(label) {
            return Err(SpecError::DuplicateLabel {
                block,
                label: label.to_string(),
            });
        }
    }
    Ok(())
}

/// Raw wire-format mirrors.
///
/// Deserialization lands here first (with unknown fields rejected), then
/// funnels through the validating constructors, so a parsed tree is always a
/// validated tree.
mod raw {
    use serde::Deserialize;

    use super::{
        Block, ChoiceBlock, ChoiceCase, CompositeBlock, JoinMode, LoopBlock, ParallelBlock,
        ParallelBranch, SequenceBlock, SpecError, TaskReference,
    };

    fn with_node_id<T, F>(node_id: Option<String>, value: T, attach: F) -> Result<T, SpecError>
    where
        F: FnOnce(T, String) -> Result<T, SpecError>,
    {
        match node_id {
            Some(id) => attach(value, id),
            None => Ok(value),
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawTaskReference {
        #[serde(default)]
        node_id: Option<String>,
        task_id: String,
    }

    impl TryFrom<RawTaskReference> for TaskReference {
        type Error = SpecError;

        fn try_from(raw: RawTaskReference) -> Result<Self, SpecError> {
            with_node_id(raw.node_id, TaskReference::new(raw.task_id)?, |t, id| {
                t.with_node_id(id)
            })
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawSequenceBlock {
        #[serde(default)]
        node_id: Option<String>,
        items: Vec<Block>,
    }

    impl TryFrom<RawSequenceBlock> for SequenceBlock {
        type Error = SpecError;

        fn try_from(raw: RawSequenceBlock) -> Result<Self, SpecError> {
            with_node_id(raw.node_id, SequenceBlock::new(raw.items)?, |s, id| {
                s.with_node_id(id)
            })
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawChoiceCase {
        #[serde(default)]
        node_id: Option<String>,
        label: String,
        #[serde(default)]
        guard: Option<String>,
        body: Block,
    }

    impl TryFrom<RawChoiceCase> for ChoiceCase {
        type Error = SpecError;

        fn try_from(raw: RawChoiceCase) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                ChoiceCase::new(raw.label, raw.guard, raw.body)?,
                |c, id| c.with_node_id(id),
            )
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawChoiceBlock {
        #[serde(default)]
        node_id: Option<String>,
        cases: Vec<ChoiceCase>,
        #[serde(default, rename = "default")]
        default_case: Option<Box<Block>>,
    }

    impl TryFrom<RawChoiceBlock> for ChoiceBlock {
        type Error = SpecError;

        fn try_from(raw: RawChoiceBlock) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                ChoiceBlock::new(raw.cases, raw.default_case.map(|b| *b))?,
                |c, id| c.with_node_id(id),
            )
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawParallelBranch {
        #[serde(default)]
        node_id: Option<String>,
        label: String,
        body: Block,
    }

    impl TryFrom<RawParallelBranch> for ParallelBranch {
        type Error = SpecError;

        fn try_from(raw: RawParallelBranch) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                ParallelBranch::new(raw.label, raw.body)?,
                |b, id| b.with_node_id(id),
            )
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawParallelBlock {
        #[serde(default)]
        node_id: Option<String>,
        branches: Vec<ParallelBranch>,
        #[serde(default)]
        join: JoinMode,
    }

    impl TryFrom<RawParallelBlock> for ParallelBlock {
        type Error = SpecError;

        fn try_from(raw: RawParallelBlock) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                ParallelBlock::new(raw.branches, raw.join)?,
                |p, id| p.with_node_id(id),
            )
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawLoopBlock {
        #[serde(default)]
        node_id: Option<String>,
        body: Box<Block>,
        guard: String,
        #[serde(default)]
        max_iters: Option<u32>,
    }

    impl TryFrom<RawLoopBlock> for LoopBlock {
        type Error = SpecError;

        fn try_from(raw: RawLoopBlock) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                LoopBlock::new(*raw.body, raw.guard, raw.max_iters)?,
                |l, id| l.with_node_id(id),
            )
        }
    }

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct RawCompositeBlock {
        #[serde(default)]
        node_id: Option<String>,
        name: String,
        body: Box<Block>,
    }

    impl TryFrom<RawCompositeBlock> for CompositeBlock {
        type Error = SpecError;

        fn try_from(raw: RawCompositeBlock) -> Result<Self, SpecError> {
            with_node_id(
                raw.node_id,
                CompositeBlock::new(raw.name, *raw.body)?,
                |c, id| c.with_node_id(id),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(task_id: &str) -> Block {
        TaskReference::new(task_id).unwrap().into()
    }

    /// Canonical nested workflow used across the test suites.
    fn nested_spec() -> Block {
        SequenceBlock::new(vec![
            task("ingest"),
            ParallelBlock::new(
                vec![
                    ParallelBranch::new("train", task("train")).unwrap(),
                    ParallelBranch::new("eval", task("eval")).unwrap(),
                ],
                JoinMode::And,
            )
            .unwrap()
            .into(),
            ChoiceBlock::new(
                vec![ChoiceCase::new(
                    "publish",
                    Some("is_good".to_string()),
                    task("publish"),
                )
                .unwrap()],
                Some(
                    LoopBlock::new(task("tune"), "not_good", Some(3))
                        .unwrap()
                        .into(),
                ),
            )
            .unwrap()
            .into(),
            CompositeBlock::new(
                "packaging",
                SequenceBlock::new(vec![task("bundle"), task("upload")]).unwrap(),
            )
            .unwrap()
            .into(),
        ])
        .unwrap()
        .into()
    }

    #[test]
    fn test_sequence_rejects_empty_items() {
        let err = SequenceBlock::new(vec![]).unwrap_err();
        assert_eq!(
            err,
            SpecError::EmptyCollection {
                block: "SequenceBlock",
                field: "items"
            }
        );
    }

    #[test]
    fn test_choice_rejects_empty_cases() {
        let err = ChoiceBlock::new(vec![], None).unwrap_err();
        assert_eq!(
            err,
            SpecError::EmptyCollection {
                block: "ChoiceBlock",
                field: "cases"
            }
        );
    }

    #[test]
    fn test_choice_rejects_duplicate_case_labels() {
        let cases = vec![
            ChoiceCase::new("a", None, task("x")).unwrap(),
            ChoiceCase::new("a", None, task("y")).unwrap(),
        ];
        let err = ChoiceBlock::new(cases, None).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateLabel { label, .. } if label == "a"));
    }

    #[test]
    fn test_choice_rejects_default_label_alongside_default_branch() {
        let cases = vec![ChoiceCase::new("default", Some("p".to_string()), task("a")).unwrap()];
        let err = ChoiceBlock::new(cases, Some(task("b"))).unwrap_err();
        assert_eq!(
            err,
            SpecError::ReservedLabel {
                block: "ChoiceBlock.cases",
                label: "default".to_string()
            }
        );
    }

    #[test]
    fn test_choice_allows_default_label_without_default_branch() {
        let cases = vec![
            ChoiceCase::new("go", Some("p".to_string()), task("a")).unwrap(),
            ChoiceCase::new("default", None, task("b")).unwrap(),
        ];
        assert!(ChoiceBlock::new(cases, None).is_ok());
    }

    #[test]
    fn test_load_rejects_default_label_alongside_default_branch() {
        let result = serde_json::from_value::<Block>(serde_json::json!({
            "kind": "choice",
            "cases": [
                {"label": "default", "guard": "p", "body": {"kind": "task_ref", "task_id": "a"}},
            ],
            "default": {"kind": "task_ref", "task_id": "b"},
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_parallel_rejects_duplicate_branch_labels() {
        let branches = vec![
            ParallelBranch::new("b", task("x")).unwrap(),
            ParallelBranch::new("b", task("y")).unwrap(),
        ];
        let err = ParallelBlock::new(branches, JoinMode::And).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateLabel { label, .. } if label == "b"));
    }

    #[test]
    fn test_loop_rejects_zero_max_iters() {
        let err = LoopBlock::new(task("t"), "g", Some(0)).unwrap_err();
        assert_eq!(err, SpecError::NonPositiveMaxIters);
    }

    #[test]
    fn test_rejects_empty_identifiers() {
        assert!(TaskReference::new("  ").is_err());
        assert!(ChoiceCase::new("", None, task("t")).is_err());
        assert!(LoopBlock::new(task("t"), " ", None).is_err());
        assert!(CompositeBlock::new("", task("t")).is_err());
    }

    #[test]
    fn test_case_and_branch_node_ids_roundtrip() {
        let case = ChoiceCase::new("go", None, task("a"))
            .unwrap()
            .with_node_id("case_go")
            .unwrap();
        assert_eq!(case.node_id(), Some("case_go"));

        let branch = ParallelBranch::new("fast", task("b"))
            .unwrap()
            .with_node_id("branch_fast")
            .unwrap();
        assert_eq!(branch.node_id(), Some("branch_fast"));

        let parsed: ChoiceCase = serde_json::from_value(serde_json::json!({
            "node_id": "case_go",
            "label": "go",
            "body": {"kind": "task_ref", "task_id": "a"},
        }))
        .unwrap();
        assert_eq!(parsed, case);
    }

    #[test]
    fn test_identifiers_are_trimmed() {
        let t = TaskReference::new("  ingest  ").unwrap();
        assert_eq!(t.task_id(), "ingest");
    }

    #[test]
    fn test_nested_spec_json_roundtrip() {
        let spec = nested_spec();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "sequence");
        assert_eq!(json["items"][0]["kind"], "task_ref");
        assert_eq!(json["items"][1]["join"], "AND");
        assert_eq!(json["items"][2]["default"]["max_iters"], 3);

        let parsed: Block = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, spec);
    }

    #[test]
    fn test_optional_fields_serialize_explicitly() {
        let json = serde_json::to_value(task("t1")).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("node_id"));
        assert!(obj["node_id"].is_null());
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let result = serde_json::from_value::<Block>(serde_json::json!({
            "kind": "task_ref",
            "task_id": "t1",
            "retries": 3,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_invalid_tree() {
        // Empty items must fail on load the same way it fails in code.
        let result = serde_json::from_value::<Block>(serde_json::json!({
            "kind": "sequence",
            "items": [],
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_parallel_join_defaults_to_and_on_load() {
        let parsed: Block = serde_json::from_value(serde_json::json!({
            "kind": "parallel",
            "branches": [
                {"label": "only", "body": {"kind": "task_ref", "task_id": "t"}},
            ],
        }))
        .unwrap();
        match parsed {
            Block::Parallel(p) => assert_eq!(p.join(), JoinMode::And),
            other => panic!("expected parallel, got {}", other.kind()),
        }
    }
}
