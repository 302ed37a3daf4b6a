//! Error types for GraphIR validation

use thiserror::Error;

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Structural violations rejected at graph construction
///
/// These apply uniformly whether a graph came out of the compiler or was
/// assembled by hand; there is no trusted producer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// Two nodes share one id
    #[error("duplicate node_id '{node_id}'")]
    DuplicateNodeId { node_id: String },

    /// An edge references a node id that does not exist
    #[error("edge '{src}' -> '{dst}' references unknown node '{node_id}'")]
    UnknownEdgeEndpoint {
        src: String,
        dst: String,
        node_id: String,
    },

    /// Two edges share the same (src, dst, label) triple
    #[error("duplicate edge '{src}' -> '{dst}' (label {label:?})")]
    DuplicateEdge {
        src: String,
        dst: String,
        label: Option<String>,
    },

    /// entry_id does not reference an existing node
    #[error("entry_id '{node_id}' not found in nodes")]
    EntryNotFound { node_id: String },

    /// exit_id does not reference an existing node
    #[error("exit_id '{node_id}' not found in nodes")]
    ExitNotFound { node_id: String },

    /// A TASK node has no task_id
    #[error("TASK node '{node_id}' missing task_id")]
    MissingTaskId { node_id: String },

    /// A non-TASK node carries a task_id
    #[error("node '{node_id}' carries task_id but is not a TASK node")]
    UnexpectedTaskId { node_id: String },

    /// An identifier-like string was empty after trimming
    #[error("{field} must be a non-empty string")]
    EmptyIdentifier { field: &'static str },
}
