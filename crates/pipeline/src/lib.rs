//! Incremental computation planner and cooperative executor for Scry query
//! pipelines.
//!
//! Given a [`scry_graph::Graph`] and a live `(data, context)` pair, this
//! crate re-derives the results for every depth on the graph's current path
//! with minimal recomputation, tolerating query failures at any depth
//! without losing downstream state.
//!
//! # Architecture
//!
//! ```text
//! Session::compute_graph(graph, live_query, data, context)
//!     │
//!     ├─ Planner: reuse the longest valid cached prefix, create fresh
//!     │  records past the divergence point   (plan.rs)
//!     │
//!     └─ Executor: run the plan root-to-leaf, one query evaluation per
//!        scheduler turn, threading each step's output into the next
//!        (executor.rs)
//! ```
//!
//! The three external seams are traits/callbacks supplied by the host:
//!
//! - [`QueryEngine`] — evaluates one query expression against `(data,
//!   context)`; the expression language is opaque here.
//! - [`Scheduler`] — "run the next step on a future turn"; production code
//!   yields to the host event loop ([`YieldScheduler`]), tests run inline
//!   ([`ImmediateScheduler`]).
//! - the observer callback on [`Session`] — fired once per state transition
//!   of each depth so a UI can paint progress.
//!
//! Memoization compares `data`/`context` by handle identity
//! ([`std::sync::Arc::ptr_eq`]): the owning application produces stable
//! references per render cycle, so an O(1) pointer comparison gives no
//! false positives and only cheap false negatives.
//!
//! Cancellation is explicit: each plan carries a [`PlanToken`], revoked when
//! a newer plan is installed. Every continuation re-checks the token after a
//! yield point and aborts with [`ComputeError::Superseded`] instead of
//! racing stale writes into the shared cache.

#![allow(clippy::missing_panics_doc, reason = "Internal crate")]

mod computation;
mod engine;
mod error;
mod executor;
mod plan;
mod schedule;
mod session;

pub use computation::{
    Computation, ComputationCache, ComputationCell, ComputationState, ValueHandle, path_key,
};
pub use engine::{FnEngine, QueryEngine};
pub use error::ComputeError;
pub use executor::{StepObserver, execute_computation_plan};
pub use plan::{ComputationPlan, PlanToken, create_computation_plan};
pub use schedule::{ImmediateScheduler, Scheduler, YieldScheduler};
pub use session::Session;
