//! Computation records and the depth-indexed cache.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Opaque handle to a host value, compared by identity during memoization.
pub type ValueHandle<V> = Arc<V>;

/// Shared, in-place-mutable computation record.
///
/// The executor mutates the record as it progresses; observers read
/// snapshots. Records are shared between the cache and the current plan so
/// that a reused prefix keeps its identity across plans.
pub type ComputationCell<V> = Arc<Mutex<Computation<V>>>;

/// Lifecycle of one computation record.
///
/// `Awaiting → Computing → {Successful | Failed}`; any state may be forced
/// to `Canceled` when an ancestor on the same path fails or the plan is
/// discarded before the depth is reached. `Canceled`, `Failed` and
/// `Successful` are terminal for the record instance — a new record is
/// created at the same depth on the next planner pass if inputs changed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComputationState {
    /// Scheduled but not yet started.
    Awaiting,
    /// Inputs bound; the query evaluation runs on the next scheduler turn.
    Computing,
    /// Evaluation produced a value.
    Successful,
    /// Evaluation raised an error.
    Failed,
    /// Abandoned: an ancestor failed, or the plan was superseded.
    Canceled,
}

impl ComputationState {
    /// Whether the record has reached a terminal state.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Successful | Self::Failed | Self::Canceled)
    }

    /// Whether the record settled by actually evaluating its query
    /// (successfully or not). Only settled records are reusable by the
    /// planner; a `Canceled` record never bound a result.
    #[inline]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Successful | Self::Failed)
    }
}

/// Materialized result for one depth along the current path.
#[derive(Debug)]
pub struct Computation<V> {
    /// Current lifecycle state.
    pub state: ComputationState,
    /// Depth-index path serialized for identity and debugging, e.g. `"0 2 1"`.
    pub path: String,
    /// The query text in effect for this depth (the stored node query, or
    /// the live-edited text at the target depth).
    pub query: String,
    /// Input value bound at scheduling time.
    pub data: Option<ValueHandle<V>>,
    /// Context value bound at scheduling time.
    pub context: Option<ValueHandle<V>>,
    /// Result, once successful.
    pub computed: Option<ValueHandle<V>>,
    /// Evaluation error, once failed.
    pub error: Option<Arc<anyhow::Error>>,
    /// Wall-clock time spent evaluating.
    pub duration: Duration,
}

impl<V> Computation<V> {
    /// Create a fresh record for `path`/`query` in the given initial state.
    pub fn new(path: String, query: String, state: ComputationState) -> Self {
        Self {
            state,
            path,
            query,
            data: None,
            context: None,
            computed: None,
            error: None,
            duration: Duration::ZERO,
        }
    }
}

// Manual impl: V itself need not be Clone, the record only holds handles.
impl<V> Clone for Computation<V> {
    fn clone(&self) -> Self {
        Self {
            state: self.state,
            path: self.path.clone(),
            query: self.query.clone(),
            data: self.data.clone(),
            context: self.context.clone(),
            computed: self.computed.clone(),
            error: self.error.clone(),
            duration: self.duration,
        }
    }
}

/// Serialize a depth-index path for record identity, e.g. `[0, 2, 1]` into
/// `"0 2 1"`.
pub fn path_key(path: &[usize]) -> String {
    let mut key = String::new();
    for (position, index) in path.iter().enumerate() {
        if position > 0 {
            key.push(' ');
        }
        key.push_str(&index.to_string());
    }
    key
}

/// Depth-indexed sequence of computation records for one session.
///
/// `cache[i]` corresponds to `current[..=i]`; the length tracks the
/// last-planned `current.len()`. The cache is the only shared mutable state
/// in the pipeline: the executor writes it (for the live plan only), and UI
/// readers tolerate records in any state at any time.
#[derive(Debug, Default)]
pub struct ComputationCache<V> {
    cells: Vec<ComputationCell<V>>,
}

impl<V> ComputationCache<V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Number of cached depths.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The record at `depth`, if one was planned.
    pub fn get(&self, depth: usize) -> Option<&ComputationCell<V>> {
        self.cells.get(depth)
    }

    /// Replace the cache contents with the cells of a freshly built plan.
    pub(crate) fn adopt(&mut self, cells: &[ComputationCell<V>]) {
        self.cells.clear();
        self.cells.extend(cells.iter().map(Arc::clone));
    }

    /// Snapshot every record (for UI sync and tests).
    pub fn snapshot(&self) -> Vec<Computation<V>> {
        self.cells.iter().map(|cell| cell.lock().clone()).collect()
    }

    /// The shared cells themselves (identity matters for reuse checks).
    pub fn cells(&self) -> &[ComputationCell<V>] {
        &self.cells
    }
}
