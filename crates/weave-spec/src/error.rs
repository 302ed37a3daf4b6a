//! Error types for specification validation

use thiserror::Error;

/// Result type alias using SpecError
pub type Result<T> = std::result::Result<T, SpecError>;

/// Errors raised while constructing a specification tree
///
/// Every variant is fatal to construction: a `Block` value either satisfies
/// all structural constraints or is never produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    /// A required collection was empty
    #[error("{block}.{field} must be non-empty")]
    EmptyCollection {
        block: &'static str,
        field: &'static str,
    },

    /// Two cases or branches within one block share a label
    #[error("{block} labels must be unique, duplicate label '{label}'")]
    DuplicateLabel { block: &'static str, label: String },

    /// A case used a label reserved for the compiler's own edge labels
    #[error("{block} label '{label}' is reserved when a default branch is present")]
    ReservedLabel { block: &'static str, label: String },

    /// An identifier-like string was empty after trimming
    #[error("{block}.{field} must be a non-empty string")]
    EmptyIdentifier {
        block: &'static str,
        field: &'static str,
    },

    /// LoopBlock.max_iters was zero
    #[error("LoopBlock.max_iters must be positive when provided")]
    NonPositiveMaxIters,
}
