//! Plan execution under cooperative scheduling.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, trace};

use crate::computation::{Computation, ComputationCell, ComputationState, ValueHandle};
use crate::engine::QueryEngine;
use crate::error::ComputeError;
use crate::plan::ComputationPlan;
use crate::schedule::Scheduler;

/// Per-step observer callback; fired once per state transition of a depth.
pub type StepObserver<V> = dyn Fn(&Computation<V>) + Send + Sync;

/// Run `plan` from `start` to completion, settling the target (last) record.
///
/// Steps execute strictly in path order. Each step's bound `data` threads
/// from the previous step's output; `context` is constant for the run. A
/// record already settled from cache (or pre-canceled by the planner)
/// advances synchronously with no yield — cache hits cost zero scheduler
/// turns. A record that actually evaluates costs exactly one
/// `scheduler.post()` yield, taken *before* the evaluation so the host can
/// repaint first.
///
/// A failure at depth `k` never rejects the future: it is recorded on that
/// record and forces every deeper depth to `Canceled`; the future still
/// resolves with a snapshot of the target record. The only rejection is
/// [`ComputeError::Superseded`], returned when the plan's token is found
/// revoked at a cancellation check (re-evaluated after every yield point),
/// before any further cache writes.
pub async fn execute_computation_plan<E: QueryEngine>(
    plan: &ComputationPlan<E::Value>,
    start: usize,
    data: ValueHandle<E::Value>,
    context: ValueHandle<E::Value>,
    engine: &E,
    scheduler: &dyn Scheduler,
    observer: Option<&StepObserver<E::Value>>,
) -> Result<Computation<E::Value>, ComputeError> {
    if plan.is_empty() {
        return Err(ComputeError::EmptyPlan);
    }

    let mut data = data;
    let mut ancestor_failed = false;

    for index in start..plan.len() {
        if plan.token().is_revoked() {
            debug!("execute: plan superseded before depth {index}");
            return Err(ComputeError::Superseded);
        }

        let cell = plan.step(index);
        let due = bind_step(cell, &data, &context, ancestor_failed, observer);

        if due {
            // The one suspension point per evaluated step.
            scheduler.post().await;
            if plan.token().is_revoked() {
                debug!("execute: plan superseded at depth {index}");
                return Err(ComputeError::Superseded);
            }
            evaluate_step::<E>(cell, &data, &context, engine, observer);
        }

        let record = cell.lock();
        match record.state {
            ComputationState::Successful => {
                if let Some(value) = &record.computed {
                    data = Arc::clone(value);
                }
            }
            ComputationState::Failed | ComputationState::Canceled => {
                ancestor_failed = true;
            }
            ComputationState::Awaiting | ComputationState::Computing => {}
        }
    }

    let target = plan.step(plan.len() - 1);
    Ok(target.lock().clone())
}

/// Decide what a depth needs this turn, binding inputs when it is due to
/// evaluate. Returns whether an evaluation should run.
fn bind_step<V>(
    cell: &ComputationCell<V>,
    data: &ValueHandle<V>,
    context: &ValueHandle<V>,
    ancestor_failed: bool,
    observer: Option<&StepObserver<V>>,
) -> bool {
    let (due, transitioned) = {
        let mut record = cell.lock();
        if ancestor_failed && !record.state.is_terminal() {
            record.state = ComputationState::Canceled;
            (false, true)
        } else if record.state == ComputationState::Awaiting {
            record.state = ComputationState::Computing;
            record.data = Some(Arc::clone(data));
            record.context = Some(Arc::clone(context));
            (true, true)
        } else {
            // Resolved from cache or pre-canceled by the planner.
            (false, false)
        }
    };
    if transitioned {
        notify(cell, observer);
    }
    due
}

/// Run the external evaluation for one depth and settle its record.
fn evaluate_step<E: QueryEngine>(
    cell: &ComputationCell<E::Value>,
    data: &ValueHandle<E::Value>,
    context: &ValueHandle<E::Value>,
    engine: &E,
    observer: Option<&StepObserver<E::Value>>,
) {
    let query = cell.lock().query.clone();
    let started = Instant::now();
    let result = engine.evaluate(&query, data, context);
    let elapsed = started.elapsed();

    {
        let mut record = cell.lock();
        record.duration = elapsed;
        match result {
            Ok(value) => {
                trace!("execute: {:?} successful in {elapsed:?}", record.path);
                record.state = ComputationState::Successful;
                record.computed = Some(Arc::new(value));
            }
            Err(error) => {
                trace!("execute: {:?} failed in {elapsed:?}: {error}", record.path);
                record.state = ComputationState::Failed;
                record.error = Some(Arc::new(error));
            }
        }
    }
    notify(cell, observer);
}

fn notify<V>(cell: &ComputationCell<V>, observer: Option<&StepObserver<V>>) {
    if let Some(observer) = observer {
        let snapshot = cell.lock().clone();
        observer(&snapshot);
    }
}
