//! Structural edit operations.
//!
//! All edits clone the input graph, apply the change to the clone, and
//! return it; the caller swaps the new graph in once it is ready. Every edit
//! other than [`select`] inserts an *empty* new current node — the live
//! editor, not the graph, holds the authoritative text for the current node,
//! which is why edits take the live `query`/`view` as arguments and commit
//! them into the node being left.

use log::trace;

use crate::error::GraphError;
use crate::node::{Graph, GraphNode};

/// Result of a navigation edit: the new graph plus the live editor text for
/// the newly selected node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The edited graph.
    pub graph: Graph,
    /// Live query text for the new current node.
    pub query: Option<String>,
    /// Live view hint for the new current node.
    pub view: Option<String>,
}

/// Push a new empty child onto the current node and select it.
///
/// The current node's in-progress editor text is committed into the node
/// before branching.
pub fn subquery(
    graph: &Graph,
    live_query: Option<String>,
    live_view: Option<String>,
) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    next.normalize();
    let current = next.current.clone();
    let node = next.node_at_mut(&current)?;
    node.query = live_query;
    node.view = live_view;
    let children = node.children.get_or_insert_with(Vec::new);
    children.push(GraphNode::default());
    let child_index = children.len() - 1;
    next.current.push(child_index);
    trace!("subquery: current -> {:?}", next.current);
    Ok(next)
}

/// Insert a new empty sibling immediately after the current node and select
/// it. The old current node's editor text is committed first.
pub fn stash(
    graph: &Graph,
    live_query: Option<String>,
    live_view: Option<String>,
) -> Result<Graph, GraphError> {
    insert_sibling(graph, live_query, live_view, false)
}

/// Like [`stash`], but the new sibling starts with a copy of the old
/// current node's committed query and view instead of empty
/// (duplicate-and-continue semantics).
pub fn clone_step(
    graph: &Graph,
    live_query: Option<String>,
    live_view: Option<String>,
) -> Result<Graph, GraphError> {
    insert_sibling(graph, live_query, live_view, true)
}

fn insert_sibling(
    graph: &Graph,
    live_query: Option<String>,
    live_view: Option<String>,
    copy_forward: bool,
) -> Result<Graph, GraphError> {
    let mut next = graph.clone();
    next.normalize();
    let current = next.current.clone();
    let node = next.node_at_mut(&current)?;
    node.query = live_query.clone();
    node.view = live_view.clone();

    let sibling = if copy_forward {
        GraphNode {
            query: live_query,
            view: live_view,
            ..GraphNode::default()
        }
    } else {
        GraphNode::default()
    };

    let (slot, parent_path) = split_last(&current)?;
    let siblings = next.children_at_mut(parent_path)?;
    siblings.insert(slot + 1, sibling);
    if let Some(last) = next.current.last_mut() {
        *last = slot + 1;
    }
    let op = if copy_forward { "clone" } else { "stash" };
    trace!("{op}: current -> {:?}", next.current);
    Ok(next)
}

/// Remove the current node and select a valid neighbor.
///
/// The selection shrinks one level toward the root; deleting a root-level
/// node re-targets the nearest remaining root sibling (indices clamped so a
/// valid node is always selected). The new current node's stored text is
/// handed back as the live editor text.
pub fn delete(graph: &Graph) -> Result<Selection, GraphError> {
    let mut next = graph.clone();
    next.normalize();
    let current = next.current.clone();
    let (removed, parent_path) = split_last(&current)?;

    let siblings = next.children_at_mut(parent_path)?;
    if removed >= siblings.len() {
        return Err(GraphError::PathOutOfRange {
            depth: parent_path.len(),
            index: removed,
        });
    }
    siblings.remove(removed);
    let remaining = siblings.len();

    // A parent left childless drops its children list entirely.
    if remaining == 0 && !parent_path.is_empty() {
        let parent = next.node_at_mut(parent_path)?;
        parent.children = None;
    }

    next.current.pop();
    if next.current.is_empty() {
        if remaining == 0 {
            // Deleted the sole root node; reseed.
            next.normalize();
        } else {
            let neighbor = removed.saturating_sub(1).min(remaining - 1);
            next.current.push(neighbor);
        }
    }
    trace!("delete: current -> {:?}", next.current);

    let current = next.current.clone();
    let node = next.node_at_mut(&current)?;
    let query = node.query.take();
    let view = node.view.take();
    Ok(Selection {
        graph: next,
        query,
        view,
    })
}

/// Navigate to an arbitrary existing `path`.
///
/// The old live text is committed into the node being left; the entered
/// node's stored text is handed back as the new live text and blanked on the
/// node, since the editor is now authoritative for that depth.
pub fn select(
    graph: &Graph,
    live_query: Option<String>,
    live_view: Option<String>,
    path: &[usize],
) -> Result<Selection, GraphError> {
    let mut next = graph.clone();
    next.normalize();
    if path.is_empty() {
        return Err(GraphError::EmptyPath);
    }
    // Validate the target before committing anything.
    next.resolve_path(path)?;

    let current = next.current.clone();
    let leaving = next.node_at_mut(&current)?;
    leaving.query = live_query;
    leaving.view = live_view;

    let entering = next.node_at_mut(path)?;
    let query = entering.query.take();
    let view = entering.view.take();
    next.current = path.to_vec();
    trace!("select: current -> {:?}", next.current);
    Ok(Selection {
        graph: next,
        query,
        view,
    })
}

fn split_last(path: &[usize]) -> Result<(usize, &[usize]), GraphError> {
    let (&last, parent) = path.split_last().ok_or(GraphError::EmptyPath)?;
    Ok((last, parent))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_roots() -> Graph {
        Graph {
            children: vec![
                GraphNode {
                    query: Some("a".to_owned()),
                    ..GraphNode::default()
                },
                GraphNode {
                    query: Some("b".to_owned()),
                    ..GraphNode::default()
                },
            ],
            current: vec![0],
        }
    }

    #[test]
    fn subquery_commits_and_branches() {
        let graph = two_roots();
        let next = subquery(&graph, Some("a.x".to_owned()), Some("table".to_owned())).unwrap();
        assert_eq!(next.current, vec![0, 0]);
        assert_eq!(next.children[0].query.as_deref(), Some("a.x"));
        assert_eq!(next.children[0].view.as_deref(), Some("table"));
        let child = &next.children[0].children.as_ref().unwrap()[0];
        assert_eq!(child, &GraphNode::default());
        // Input graph untouched.
        assert_eq!(graph.children[0].query.as_deref(), Some("a"));
        assert_eq!(graph.current, vec![0]);
    }

    #[test]
    fn stash_inserts_empty_sibling_after_current() {
        let graph = two_roots();
        let next = stash(&graph, Some("a2".to_owned()), None).unwrap();
        assert_eq!(next.current, vec![1]);
        assert_eq!(next.children.len(), 3);
        assert_eq!(next.children[0].query.as_deref(), Some("a2"));
        assert_eq!(next.children[1], GraphNode::default());
        assert_eq!(next.children[2].query.as_deref(), Some("b"));
    }

    #[test]
    fn clone_step_copies_committed_text_forward() {
        let graph = two_roots();
        let next = clone_step(&graph, Some("a2".to_owned()), Some("json".to_owned())).unwrap();
        assert_eq!(next.current, vec![1]);
        assert_eq!(next.children[1].query.as_deref(), Some("a2"));
        assert_eq!(next.children[1].view.as_deref(), Some("json"));
        assert!(next.children[1].children.is_none());
    }

    #[test]
    fn delete_shrinks_selection_to_parent() {
        let graph = subquery(&two_roots(), Some("a".to_owned()), None).unwrap();
        let selection = delete(&graph).unwrap();
        assert_eq!(selection.graph.current, vec![0]);
        // The parent's stored query is restored as live text and blanked.
        assert_eq!(selection.query.as_deref(), Some("a"));
        assert!(selection.graph.children[0].query.is_none());
        assert!(selection.graph.children[0].children.is_none());
    }

    #[test]
    fn delete_root_node_selects_neighbor() {
        let mut graph = two_roots();
        graph.current = vec![1];
        let selection = delete(&graph).unwrap();
        assert_eq!(selection.graph.current, vec![0]);
        assert_eq!(selection.query.as_deref(), Some("a"));
        assert_eq!(selection.graph.children.len(), 1);
    }

    #[test]
    fn delete_sole_root_node_reseeds() {
        let graph = Graph {
            children: vec![GraphNode::default()],
            current: vec![0],
        };
        let selection = delete(&graph).unwrap();
        assert_eq!(selection.graph.current, vec![0]);
        assert_eq!(selection.graph.children.len(), 1);
        assert!(selection.query.is_none());
    }

    #[test]
    fn delete_clamps_to_last_remaining_sibling() {
        let mut graph = two_roots();
        graph.children.push(GraphNode {
            query: Some("c".to_owned()),
            ..GraphNode::default()
        });
        graph.current = vec![0];
        let selection = delete(&graph).unwrap();
        // Removed index 0: neighbor clamps to 0, not -1.
        assert_eq!(selection.graph.current, vec![0]);
        assert_eq!(selection.query.as_deref(), Some("b"));
    }

    #[test]
    fn select_swaps_live_text() {
        let graph = two_roots();
        let selection = select(&graph, Some("a-live".to_owned()), None, &[1]).unwrap();
        assert_eq!(selection.graph.current, vec![1]);
        assert_eq!(selection.query.as_deref(), Some("b"));
        // Old live text committed into the node being left.
        assert_eq!(selection.graph.children[0].query.as_deref(), Some("a-live"));
        // Entered node blanked; the editor is now authoritative.
        assert!(selection.graph.children[1].query.is_none());
    }

    #[test]
    fn select_rejects_bad_path() {
        let graph = two_roots();
        assert_eq!(
            select(&graph, None, None, &[4]),
            Err(GraphError::PathOutOfRange { depth: 0, index: 4 })
        );
    }
}
