//! Plan construction: reuse the longest valid cached prefix.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::trace;
use parking_lot::Mutex;
use scry_graph::Graph;

use crate::computation::{
    Computation, ComputationCache, ComputationCell, ComputationState, ValueHandle, path_key,
};
use crate::error::ComputeError;

/// Cancellation token carried by each plan.
///
/// Installing a newer plan revokes the previous token; every executor
/// continuation re-checks its token after a yield point and abandons the
/// run once revoked, so stale writes never race a newer computation into
/// the shared cache.
#[derive(Debug, Default)]
pub struct PlanToken {
    revoked: AtomicBool,
}

impl PlanToken {
    /// Mark the owning plan as superseded.
    #[inline]
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    /// Whether the owning plan has been superseded.
    #[inline]
    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }
}

/// Ordered list of computation records to (re)execute for the current path.
#[derive(Debug)]
pub struct ComputationPlan<V> {
    steps: Vec<ComputationCell<V>>,
    token: Arc<PlanToken>,
    divergence: usize,
}

impl<V> ComputationPlan<V> {
    /// Number of depths in the plan.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the plan has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The record at `index`.
    pub fn step(&self, index: usize) -> &ComputationCell<V> {
        &self.steps[index]
    }

    /// All records, root to leaf.
    pub fn steps(&self) -> &[ComputationCell<V>] {
        &self.steps
    }

    /// First depth at which cached inputs no longer matched desired inputs.
    /// Equal to [`ComputationPlan::len`] when the whole plan was reused.
    pub fn divergence(&self) -> usize {
        self.divergence
    }

    /// This plan's cancellation token.
    pub fn token(&self) -> &PlanToken {
        &self.token
    }

    /// Shared handle to the token, for registering as the live plan.
    pub fn token_handle(&self) -> Arc<PlanToken> {
        Arc::clone(&self.token)
    }
}

/// Build an execution plan for the graph's current path.
///
/// Walks the cached records in depth order, reusing each one whose bound
/// inputs still match the expected inputs at that depth: the expected query
/// (the live editor text at the target depth, the stored node query
/// elsewhere), the serialized path, and the `data`/`context` handles
/// compared by identity. The first mismatch is the divergence point; from
/// there on, fresh records are created — `Awaiting`, or `Canceled` when an
/// already-cached ancestor failed.
///
/// The plan's cells replace the cache contents index by index, so reused
/// records keep their identity across plans.
pub fn create_computation_plan<V>(
    graph: &Graph,
    live_query: &str,
    data: &ValueHandle<V>,
    context: &ValueHandle<V>,
    cache: &mut ComputationCache<V>,
) -> Result<ComputationPlan<V>, ComputeError> {
    let nodes = graph.resolve_path(&graph.current)?;
    if nodes.is_empty() {
        return Err(ComputeError::EmptyPlan);
    }

    let depth_count = nodes.len();
    let mut steps: Vec<ComputationCell<V>> = Vec::with_capacity(depth_count);
    let mut expected_data = Arc::clone(data);
    let mut ancestor_failed = false;
    let mut divergence = 0;

    for (depth, node) in nodes.iter().enumerate() {
        let target = depth + 1 == depth_count;
        let expected_query: &str = if target {
            live_query
        } else {
            node.query.as_deref().unwrap_or("")
        };
        let expected_path = path_key(&graph.current[..=depth]);

        // Only the contiguous prefix can be reused.
        if divergence == depth {
            if let Some(cell) = cache.get(depth) {
                let cached = cell.lock();
                let reusable = cached.state.is_settled()
                    && cached.query == expected_query
                    && cached.path == expected_path
                    && handle_matches(cached.data.as_ref(), &expected_data)
                    && handle_matches(cached.context.as_ref(), context);
                if reusable {
                    trace!("plan: cache hit at depth {depth} ({expected_path:?})");
                    if cached.state == ComputationState::Failed {
                        ancestor_failed = true;
                    }
                    if let Some(value) = &cached.computed {
                        expected_data = Arc::clone(value);
                    }
                    drop(cached);
                    steps.push(Arc::clone(cell));
                    divergence = depth + 1;
                    continue;
                }
                trace!("plan: divergence at depth {depth} ({expected_path:?})");
            }
        }

        let state = if ancestor_failed {
            ComputationState::Canceled
        } else {
            ComputationState::Awaiting
        };
        let record = Computation::new(expected_path, expected_query.to_owned(), state);
        steps.push(Arc::new(Mutex::new(record)));
    }

    cache.adopt(&steps);
    Ok(ComputationPlan {
        steps,
        token: Arc::new(PlanToken::default()),
        divergence,
    })
}

fn handle_matches<V>(bound: Option<&ValueHandle<V>>, expected: &ValueHandle<V>) -> bool {
    bound.is_some_and(|handle| Arc::ptr_eq(handle, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scry_graph::{Graph, GraphNode};

    fn chain_graph(queries: &[&str]) -> Graph {
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

    fn settle_success(
        plan: &ComputationPlan<i32>,
        seed: &ValueHandle<i32>,
        context: &ValueHandle<i32>,
    ) {
        // Simulate a completed run: bind inputs and thread outputs forward.
        let mut data = Arc::clone(seed);
        for cell in plan.steps() {
            let mut record = cell.lock();
            record.data = Some(Arc::clone(&data));
            record.context = Some(Arc::clone(context));
            record.state = ComputationState::Successful;
            let value = Arc::new(*data + 1);
            record.computed = Some(Arc::clone(&value));
            data = value;
        }
    }

    #[test]
    fn fresh_plan_is_all_awaiting() {
        let graph = chain_graph(&["a", "b", "c"]);
        let data = Arc::new(0);
        let context = Arc::new(0);
        let mut cache = ComputationCache::new();
        let plan = create_computation_plan(&graph, "c-live", &data, &context, &mut cache).unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.divergence(), 0);
        for cell in plan.steps() {
            assert_eq!(cell.lock().state, ComputationState::Awaiting);
        }
        // Target depth carries the live text, others the stored query.
        assert_eq!(plan.step(0).lock().query, "a");
        assert_eq!(plan.step(2).lock().query, "c-live");
        assert_eq!(plan.step(2).lock().path, "0 0 0");
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn identical_replan_reuses_everything() {
        let graph = chain_graph(&["a", "b"]);
        let data = Arc::new(10);
        let context = Arc::new(0);
        let mut cache = ComputationCache::new();
        let first = create_computation_plan(&graph, "b", &data, &context, &mut cache).unwrap();
        settle_success(&first, &data, &context);

        let second = create_computation_plan(&graph, "b", &data, &context, &mut cache).unwrap();
        assert_eq!(second.divergence(), 2);
        for (index, cell) in second.steps().iter().enumerate() {
            assert!(Arc::ptr_eq(cell, first.step(index)));
        }
    }

    #[test]
    fn live_edit_diverges_at_target_only() {
        let graph = chain_graph(&["a", "b", "c"]);
        let data = Arc::new(10);
        let context = Arc::new(0);
        let mut cache = ComputationCache::new();
        let first = create_computation_plan(&graph, "c", &data, &context, &mut cache).unwrap();
        settle_success(&first, &data, &context);

        let second =
            create_computation_plan(&graph, "c-edited", &data, &context, &mut cache).unwrap();
        assert_eq!(second.divergence(), 2);
        assert!(Arc::ptr_eq(second.step(0), first.step(0)));
        assert!(Arc::ptr_eq(second.step(1), first.step(1)));
        assert!(!Arc::ptr_eq(second.step(2), first.step(2)));
        assert_eq!(second.step(2).lock().state, ComputationState::Awaiting);
    }

    #[test]
    fn new_data_handle_diverges_at_root() {
        let graph = chain_graph(&["a"]);
        let data = Arc::new(10);
        let context = Arc::new(0);
        let mut cache = ComputationCache::new();
        let first = create_computation_plan(&graph, "a", &data, &context, &mut cache).unwrap();
        settle_success(&first, &data, &context);

        // Equal value, different handle: identity comparison must recompute.
        let same_value_new_handle = Arc::new(10);
        let second =
            create_computation_plan(&graph, "a", &same_value_new_handle, &context, &mut cache)
                .unwrap();
        assert_eq!(second.divergence(), 0);
        assert!(!Arc::ptr_eq(second.step(0), first.step(0)));
    }

    #[test]
    fn cached_failure_cancels_fresh_descendants() {
        let graph = chain_graph(&["a", "b", "c"]);
        let data = Arc::new(1);
        let context = Arc::new(0);
        let mut cache = ComputationCache::new();
        let first = create_computation_plan(&graph, "c", &data, &context, &mut cache).unwrap();
        {
            let mut record = first.step(0).lock();
            record.data = Some(Arc::clone(&data));
            record.context = Some(Arc::clone(&context));
            record.state = ComputationState::Failed;
            record.error = Some(Arc::new(anyhow::anyhow!("boom")));
        }

        // Deeper depths never bound inputs, so they diverge; the cached
        // failure is reused and forces them to Canceled.
        let second = create_computation_plan(&graph, "c", &data, &context, &mut cache).unwrap();
        assert_eq!(second.divergence(), 1);
        assert!(Arc::ptr_eq(second.step(0), first.step(0)));
        assert_eq!(second.step(1).lock().state, ComputationState::Canceled);
        assert_eq!(second.step(2).lock().state, ComputationState::Canceled);
    }

    #[test]
    fn unnormalized_graph_is_an_empty_plan() {
        let graph = Graph::default();
        let mut cache: ComputationCache<i32> = ComputationCache::new();
        let result = create_computation_plan(&graph, "", &Arc::new(0), &Arc::new(0), &mut cache);
        assert_eq!(result.unwrap_err(), ComputeError::EmptyPlan);
    }
}
