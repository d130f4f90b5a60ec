//! Per-editor pipeline session: cache ownership and plan supersession.

use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;
use scry_graph::Graph;

use crate::computation::{Computation, ComputationCache, ComputationCell, ValueHandle};
use crate::engine::QueryEngine;
use crate::error::ComputeError;
use crate::executor::{StepObserver, execute_computation_plan};
use crate::plan::{ComputationPlan, PlanToken, create_computation_plan};
use crate::schedule::{Scheduler, YieldScheduler};

/// One pipeline session: owns the engine, scheduler, observer, computation
/// cache, and the token of the plan currently recognized as live.
///
/// Installing a plan revokes the previous plan's token, so at most one run
/// ever writes into the session's cache; superseded runs abort with
/// [`ComputeError::Superseded`] at their next cancellation check.
pub struct Session<E: QueryEngine> {
    engine: E,
    scheduler: Arc<dyn Scheduler>,
    on_step: Option<Box<StepObserver<E::Value>>>,
    cache: Mutex<ComputationCache<E::Value>>,
    live: Mutex<Option<Arc<PlanToken>>>,
}

impl<E: QueryEngine> Session<E> {
    /// Create a session with the production [`YieldScheduler`].
    pub fn new(engine: E) -> Self {
        Self::with_scheduler(engine, Arc::new(YieldScheduler))
    }

    /// Create a session with an explicit scheduler.
    pub fn with_scheduler(engine: E, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            engine,
            scheduler,
            on_step: None,
            cache: Mutex::new(ComputationCache::new()),
            live: Mutex::new(None),
        }
    }

    /// Register the per-step observer, invoked once per state transition of
    /// each depth (the UI's progress hook).
    pub fn set_observer(
        &mut self,
        observer: impl Fn(&Computation<E::Value>) + Send + Sync + 'static,
    ) {
        self.on_step = Some(Box::new(observer));
    }

    /// Build a plan for the graph's current path and register it as the
    /// live plan, revoking the previous one.
    pub fn install_plan(
        &self,
        graph: &Graph,
        live_query: &str,
        data: &ValueHandle<E::Value>,
        context: &ValueHandle<E::Value>,
    ) -> Result<ComputationPlan<E::Value>, ComputeError> {
        let mut cache = self.cache.lock();
        let plan = create_computation_plan(graph, live_query, data, context, &mut cache)?;
        drop(cache);
        let mut live = self.live.lock();
        if let Some(previous) = live.replace(plan.token_handle()) {
            debug!("session: superseding previous plan");
            previous.revoke();
        }
        Ok(plan)
    }

    /// Run an installed plan to completion.
    pub async fn execute(
        &self,
        plan: &ComputationPlan<E::Value>,
        data: ValueHandle<E::Value>,
        context: ValueHandle<E::Value>,
    ) -> Result<Computation<E::Value>, ComputeError> {
        execute_computation_plan(
            plan,
            0,
            data,
            context,
            &self.engine,
            self.scheduler.as_ref(),
            self.on_step.as_deref(),
        )
        .await
    }

    /// Plan and execute in one call: re-derive results for every depth on
    /// the graph's current path, reusing the cached prefix, and resolve with
    /// a snapshot of the target record.
    ///
    /// `live_query` is the in-editor text for the target depth (the graph
    /// stores nothing for the node being edited). Starting a newer
    /// `compute_graph` before an older one finishes supersedes the older
    /// run, which then rejects with [`ComputeError::Superseded`].
    pub async fn compute_graph(
        &self,
        graph: &Graph,
        live_query: &str,
        data: ValueHandle<E::Value>,
        context: ValueHandle<E::Value>,
    ) -> Result<Computation<E::Value>, ComputeError> {
        let plan = self.install_plan(graph, live_query, &data, &context)?;
        self.execute(&plan, data, context).await
    }

    /// The session's query engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Snapshot of every cached record, root to leaf.
    pub fn cache_snapshot(&self) -> Vec<Computation<E::Value>> {
        self.cache.lock().snapshot()
    }

    /// The shared cache cells (record identity matters for reuse checks).
    pub fn cache_cells(&self) -> Vec<ComputationCell<E::Value>> {
        self.cache.lock().cells().to_vec()
    }
}
