//! Cooperative scheduling seam.
//!
//! There is no parallelism in a pipeline run: suspension points are explicit
//! hand-offs to a caller-supplied scheduler, inserted once per plan step
//! that actually evaluates a query and never mid-evaluation. This bounds
//! host unresponsiveness to one query evaluation per turn, letting the host
//! repaint between the steps of a deep pipeline.

use futures::future::{self, BoxFuture, FutureExt as _};

/// "Run the next step on a future turn of the event loop."
pub trait Scheduler: Send + Sync {
    /// Resolve once the executor may proceed with the next evaluation.
    fn post(&self) -> BoxFuture<'static, ()>;
}

/// Production scheduler: yields to the runtime between evaluations.
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldScheduler;

impl Scheduler for YieldScheduler {
    fn post(&self) -> BoxFuture<'static, ()> {
        tokio::task::yield_now().boxed()
    }
}

/// Test scheduler: proceeds immediately, making executor runs synchronous.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
    fn post(&self) -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }
}
