//! Weave specification model
//!
//! The authoring surface for workflows: an immutable AST of control-flow
//! blocks over opaque task references. This crate is pure data plus
//! construction-time validation; it knows nothing about graphs, engines,
//! or how guards and tasks are resolved.
//!
//! Trees are persisted as JSON, one record per block discriminated by a
//! `kind` tag. Unknown fields are rejected on load.
//!
//! # Example
//!
//! ```
//! use weave_spec::{Block, SequenceBlock, TaskReference};
//!
//! let spec: Block = SequenceBlock::new(vec![
//!     TaskReference::new("ingest")?.into(),
//!     TaskReference::new("publish")?.into(),
//! ])?
//! .into();
//! assert_eq!(spec.kind(), "sequence");
//! # Ok::<(), weave_spec::SpecError>(())
//! ```

pub mod block;
pub mod error;

pub use block::{
    Block, ChoiceBlock, ChoiceCase, CompositeBlock, JoinMode, LoopBlock, ParallelBlock,
    ParallelBranch, SequenceBlock, TaskReference,
};
pub use error::{Result, SpecError};
