//! Deterministic node id allocation

/// Counter-based id generator for compiler-emitted nodes.
///
/// Produces `{prefix}0`, `{prefix}1`, ... in call order. One generator is
/// owned by one compilation call and threaded through the recursive
/// lowering by parameter, so identical trees compile to identical ids run
/// over run — downstream tooling diffs GraphIR across recompiles and
/// depends on this.
#[derive(Debug)]
pub struct IdGen {
    prefix: String,
    next: u64,
}

impl IdGen {
    /// Create a generator with the given prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 0,
        }
    }

    /// Allocate the next fresh id. Never fails.
    pub fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
