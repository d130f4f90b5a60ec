//! Error type for structural graph operations.

/// Errors produced by path resolution and structural edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A path step pointed outside the children of its level.
    PathOutOfRange {
        /// Depth of the offending path step (0 = root level).
        depth: usize,
        /// The sibling index that was out of range.
        index: usize,
    },
    /// An operation needed a non-empty path but was given an empty one.
    EmptyPath,
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PathOutOfRange { depth, index } => {
                write!(formatter, "path index {index} out of range at depth {depth}")
            }
            Self::EmptyPath => write!(formatter, "path must not be empty"),
        }
    }
}

impl std::error::Error for GraphError {}
