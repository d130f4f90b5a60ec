//! Graph and node data model, path resolution, and serialization.

use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// One pipeline step.
///
/// `query` is a transformation expression, opaque to this crate; it is
/// evaluated by the external query engine. `view` is an opaque per-node
/// rendering hint, passed through unevaluated. A `None` query means "never
/// set" and is distinct from a cleared (empty) query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Stored transformation expression for this step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Rendering hint for this step, passed through unevaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Ordered child steps (siblings at the next depth).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<GraphNode>>,
}

/// Root container: top-level steps plus the selected path.
///
/// The graph is the only value intended for persistence (e.g. in a URL
/// parameter); it round-trips through JSON with absent fields stripped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    /// Top-level root steps. Never empty after [`Graph::normalize`].
    #[serde(default)]
    pub children: Vec<GraphNode>,

    /// Sibling-index path to the selected node. Never empty after
    /// [`Graph::normalize`].
    #[serde(default)]
    pub current: Vec<usize>,
}

impl Graph {
    /// Ensure `children` and `current` are non-empty.
    ///
    /// A fresh graph gets one empty node and `current = [0]`. Idempotent.
    pub fn normalize(&mut self) {
        if self.children.is_empty() {
            self.children.push(GraphNode::default());
        }
        if self.current.is_empty() {
            self.current.push(0);
        }
    }

    /// Walk from the root following `path`, returning the visited nodes in
    /// order (excluding the root container itself).
    pub fn resolve_path(&self, path: &[usize]) -> Result<Vec<&GraphNode>, GraphError> {
        let mut visited = Vec::with_capacity(path.len());
        let mut level: &[GraphNode] = &self.children;
        for (depth, &index) in path.iter().enumerate() {
            let node = level
                .get(index)
                .ok_or(GraphError::PathOutOfRange { depth, index })?;
            visited.push(node);
            level = node.children.as_deref().unwrap_or(&[]);
        }
        Ok(visited)
    }

    /// The node addressed by `current`.
    pub fn current_node(&self) -> Result<&GraphNode, GraphError> {
        self.resolve_path(&self.current)?
            .pop()
            .ok_or(GraphError::EmptyPath)
    }

    /// Mutable access to the node addressed by `path`.
    pub(crate) fn node_at_mut(&mut self, path: &[usize]) -> Result<&mut GraphNode, GraphError> {
        let (&first, rest) = path.split_first().ok_or(GraphError::EmptyPath)?;
        let mut node = self
            .children
            .get_mut(first)
            .ok_or(GraphError::PathOutOfRange {
                depth: 0,
                index: first,
            })?;
        for (offset, &index) in rest.iter().enumerate() {
            node = node
                .children
                .as_mut()
                .and_then(|children| children.get_mut(index))
                .ok_or(GraphError::PathOutOfRange {
                    depth: offset + 1,
                    index,
                })?;
        }
        Ok(node)
    }

    /// Mutable access to the sibling list under `path` (the root list when
    /// `path` is empty).
    pub(crate) fn children_at_mut(
        &mut self,
        path: &[usize],
    ) -> Result<&mut Vec<GraphNode>, GraphError> {
        if path.is_empty() {
            return Ok(&mut self.children);
        }
        let node = self.node_at_mut(path)?;
        Ok(node.children.get_or_insert_with(Vec::new))
    }

    /// Serialize to a JSON string with absent fields stripped.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Encode for a URL parameter (percent-encoded JSON).
    pub fn to_url_param(&self) -> Result<String, serde_json::Error> {
        Ok(urlencoding::encode(&self.to_json()?).into_owned())
    }

    /// Decode from a URL parameter produced by [`Graph::to_url_param`].
    pub fn from_url_param(param: &str) -> anyhow::Result<Self> {
        let json = urlencoding::decode(param)?;
        Ok(Self::from_json(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(queries: &[&str]) -> Graph {
        let mut node: Option<GraphNode> = None;
        for query in queries.iter().rev() {
            node = Some(GraphNode {
                query: Some((*query).to_owned()),
                children: node.map(|child| vec![child]),
                ..GraphNode::default()
            });
        }
        Graph {
            children: node.into_iter().collect(),
            current: vec![0; queries.len()],
        }
    }

    #[test]
    fn normalize_seeds_empty_graph() {
        let mut graph = Graph::default();
        graph.normalize();
        assert_eq!(graph.children.len(), 1);
        assert_eq!(graph.current, vec![0]);
        assert_eq!(graph.children[0], GraphNode::default());
    }

    #[test]
    fn normalize_is_idempotent() {
        let mut graph = Graph::default();
        graph.normalize();
        let once = graph.clone();
        graph.normalize();
        assert_eq!(graph, once);
    }

    #[test]
    fn normalize_keeps_existing_selection() {
        let mut graph = chain(&["a", "b"]);
        graph.normalize();
        assert_eq!(graph.current, vec![0, 0]);
        assert_eq!(graph.children.len(), 1);
    }

    #[test]
    fn resolve_path_walks_in_order() {
        let graph = chain(&["a", "b", "c"]);
        let nodes = graph.resolve_path(&[0, 0, 0]).unwrap();
        let queries: Vec<_> = nodes
            .iter()
            .map(|node| node.query.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(queries, vec!["a", "b", "c"]);
    }

    #[test]
    fn resolve_path_reports_out_of_range() {
        let graph = chain(&["a"]);
        assert_eq!(
            graph.resolve_path(&[0, 3]),
            Err(GraphError::PathOutOfRange { depth: 1, index: 3 })
        );
        assert_eq!(
            graph.resolve_path(&[7]),
            Err(GraphError::PathOutOfRange { depth: 0, index: 7 })
        );
    }

    #[test]
    fn current_node_follows_selection() {
        let graph = chain(&["a", "b"]);
        let node = graph.current_node().unwrap();
        assert_eq!(node.query.as_deref(), Some("b"));
    }

    #[test]
    fn json_round_trip_strips_absent_fields() {
        let graph = chain(&["a"]);
        let json = graph.to_json().unwrap();
        assert!(!json.contains("view"));
        assert!(!json.contains("label"));
        assert_eq!(Graph::from_json(&json).unwrap(), graph);
    }

    #[test]
    fn url_param_round_trip() {
        let mut graph = chain(&["a b", "c&d"]);
        graph.children[0].view = Some("table".to_owned());
        let param = graph.to_url_param().unwrap();
        assert!(!param.contains(' '));
        assert_eq!(Graph::from_url_param(&param).unwrap(), graph);
    }
}
