//! Weave GraphIR model
//!
//! The flat, validated directed-graph intermediate representation the
//! orchestration engine consumes. Produced by `weave-compiler` (or built
//! directly for testing); immutable once constructed.
//!
//! Validation is structural, independent of provenance: unique node ids,
//! existing edge endpoints, no duplicate `(src, dst, label)` triples,
//! existing entry/exit, and task_id present exactly on TASK nodes. The
//! model never reasons about traversal — loop back-edges are legal and are
//! the compiler's to produce correctly.

pub mod builder;
pub mod error;
pub mod graph;

pub use builder::GraphIrBuilder;
pub use error::{GraphError, Result};
pub use graph::{Edge, GraphIr, Meta, Node, NodeId, NodeKind};
