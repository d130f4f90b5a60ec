//! The external query-evaluation seam.

use std::marker::PhantomData;

/// Evaluates one query expression against a `(data, context)` pair.
///
/// The expression language is opaque to the pipeline; the host supplies the
/// evaluator. Implementations must be pure with respect to their inputs
/// (safe to call repeatedly with identical arguments, aside from
/// performance) and report malformed or failing queries as errors rather
/// than panicking.
pub trait QueryEngine: Send + Sync {
    /// Value type flowing through the pipeline.
    type Value: Send + Sync + 'static;

    /// Evaluate `query` against `data` in `context`.
    fn evaluate(
        &self,
        query: &str,
        data: &Self::Value,
        context: &Self::Value,
    ) -> anyhow::Result<Self::Value>;
}

/// Adapter turning a closure into a [`QueryEngine`].
///
/// Mostly useful in tests and small hosts:
///
/// ```
/// use scry_pipeline::{FnEngine, QueryEngine};
///
/// let engine = FnEngine::new(|query: &str, data: &i64, _context: &i64| -> anyhow::Result<i64> {
///     Ok(data + query.len() as i64)
/// });
/// assert_eq!(engine.evaluate("abc", &1, &0).unwrap(), 4);
/// ```
pub struct FnEngine<V, F> {
    eval: F,
    _marker: PhantomData<fn() -> V>,
}

impl<V, F> FnEngine<V, F> {
    /// Wrap `eval` as a query engine.
    pub fn new(eval: F) -> Self {
        Self {
            eval,
            _marker: PhantomData,
        }
    }
}

impl<V, F> QueryEngine for FnEngine<V, F>
where
    V: Send + Sync + 'static,
    F: Fn(&str, &V, &V) -> anyhow::Result<V> + Send + Sync,
{
    type Value = V;

    fn evaluate(&self, query: &str, data: &V, context: &V) -> anyhow::Result<V> {
        (self.eval)(query, data, context)
    }
}
