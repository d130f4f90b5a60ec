//! Persistent query-pipeline tree for the Scry data explorer.
//!
//! A [`Graph`] is a tree of chained data-transformation steps. Each
//! [`GraphNode`] holds one query expression (opaque to this crate) plus an
//! optional rendering hint, and the graph tracks a *current path* — the
//! sibling-index sequence identifying the node being edited. Structural
//! edits never mutate the graph they are given: every edit clones first and
//! returns a new value, so in-flight readers (the computation cache, the
//! executor) keep observing a stable graph until the caller swaps the new
//! one in.
//!
//! The *live editor* is authoritative for the current node: its in-progress
//! text lives outside the graph and is only committed back into the node
//! when the user navigates away. Edits therefore take the live text as an
//! argument, and navigation edits ([`select`], [`delete`]) hand the entered
//! node's text back out through a [`Selection`].
//!
//! # Example
//!
//! ```
//! use scry_graph::{Graph, subquery};
//!
//! let mut graph = Graph::default();
//! graph.normalize();
//!
//! // Commit the editor text ".items" and branch into a child step.
//! let next = subquery(&graph, Some(".items".to_owned()), None).unwrap();
//! assert_eq!(next.current, vec![0, 0]);
//! assert_eq!(graph.current, vec![0]); // the input graph is untouched
//! ```

#![allow(clippy::missing_panics_doc, reason = "Internal crate")]

mod edit;
mod error;
mod node;

pub use edit::{Selection, clone_step, delete, select, stash, subquery};
pub use error::GraphError;
pub use node::{Graph, GraphNode};
