//! Compilation options

/// Options controlling one compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Identifier for the emitted graph.
    pub graph_id: String,
    /// Prefix for generated node ids. Pick distinct prefixes when
    /// composing multiple compiled graphs to avoid id collisions.
    pub node_id_prefix: String,
    /// Whether author-supplied `node_id`s on task references are honored
    /// in place of generated ids. Collisions between preserved and
    /// generated ids are caught by final graph validation, not pre-checked.
    pub preserve_spec_node_ids: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            graph_id: "workflow".to_string(),
            node_id_prefix: "n".to_string(),
            preserve_spec_node_ids: true,
        }
    }
}

impl CompileOptions {
    /// Default options with the given graph id.
    pub fn new(graph_id: impl Into<String>) -> Self {
        Self {
            graph_id: graph_id.into(),
            ..Self::default()
        }
    }

    /// Set the generated-id prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.node_id_prefix = prefix.into();
        self
    }

    /// Enable or disable honoring author-supplied node ids.
    pub fn preserve_spec_node_ids(mut self, preserve: bool) -> Self {
        self.preserve_spec_node_ids = preserve;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CompileOptions::default();
        assert_eq!(opts.graph_id, "workflow");
        assert_eq!(opts.node_id_prefix, "n");
        assert!(opts.preserve_spec_node_ids);
    }

    #[test]
    fn test_chained_configuration() {
        let opts = CompileOptions::new("g")
            .with_prefix("wf_")
            .preserve_spec_node_ids(false);
        assert_eq!(opts.graph_id, "g");
        assert_eq!(opts.node_id_prefix, "wf_");
        assert!(!opts.preserve_spec_node_ids);
    }
}
