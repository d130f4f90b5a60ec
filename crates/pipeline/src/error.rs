//! Error taxonomy for plan construction and execution.

use scry_graph::GraphError;

/// Errors surfaced by [`crate::Session::compute_graph`] and the lower-level
/// plan/execute entry points.
///
/// Query evaluation failures are *not* errors here: they are recorded on the
/// affected [`crate::Computation`] (state `Failed`, descendants `Canceled`)
/// and the execution future still resolves. The only rejection paths are
/// supersession and structural misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeError {
    /// The plan was replaced by a newer one before finishing. Callers must
    /// not update UI state on this path.
    Superseded,
    /// The current path could not be resolved against the graph.
    Graph(GraphError),
    /// The plan had no steps (an unnormalized graph produces this).
    EmptyPlan,
}

impl std::fmt::Display for ComputeError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Superseded => write!(formatter, "computation superseded by a newer plan"),
            Self::Graph(error) => write!(formatter, "graph error: {error}"),
            Self::EmptyPlan => write!(formatter, "computation plan has no steps"),
        }
    }
}

impl std::error::Error for ComputeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Graph(error) => Some(error),
            Self::Superseded | Self::EmptyPlan => None,
        }
    }
}

impl From<GraphError> for ComputeError {
    fn from(error: GraphError) -> Self {
        Self::Graph(error)
    }
}
