//! Error types for the lowering pass

use thiserror::Error;
use weave_ir::GraphError;

/// Result type alias using CompileError
pub type Result<T> = std::result::Result<T, CompileError>;

/// Errors raised during compilation
///
/// Compilation is pure: nothing here is transient or retryable. The caller
/// fixes the input and compiles again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Final graph assembly rejected the emitted nodes/edges, e.g. an
    /// author-preserved node id collided with another id.
    #[error("graph assembly failed: {0}")]
    Graph(#[from] GraphError),

    /// Extension guard: a block kind with no lowering rule reached the
    /// top-level dispatch. Unreachable while the block union stays closed.
    #[error("no lowering rule for block kind '{kind}'")]
    Unsupported { kind: String },
}
