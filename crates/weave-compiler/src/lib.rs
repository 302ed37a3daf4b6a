//! Weave compiler - specification trees to executable GraphIR
//!
//! A single deterministic structural lowering pass. It consumes a
//! `weave-spec` block tree, emits `weave-ir` nodes and edges with stable
//! counter-based ids, wraps the whole tree in one global ENTRY and one
//! global EXIT, and returns a fully validated graph. No optimization, no
//! dead-code elimination, no interpretation of guards or task payloads:
//! guard and task identifiers pass through opaquely for the engine to
//! resolve.
//!
//! # Example
//!
//! ```
//! use weave_compiler::{compile, CompileOptions};
//! use weave_spec::{Block, SequenceBlock, TaskReference};
//!
//! let spec: Block = SequenceBlock::new(vec![
//!     TaskReference::new("t1").unwrap().into(),
//! ])
//! .unwrap()
//! .into();
//!
//! let graph = compile(&spec, &CompileOptions::new("g")).unwrap();
//! assert_eq!(graph.nodes().len(), 3); // ENTRY, TASK, EXIT
//! assert_eq!(graph.edges().len(), 2);
//! ```

pub mod compile;
pub mod error;
pub mod idgen;
pub mod options;

pub use compile::{
    compile, compile_with_provenance, CompositeProvenance, META_JOIN, META_MAX_ITERS,
};
pub use error::{CompileError, Result};
pub use idgen::IdGen;
pub use options::CompileOptions;
