//! Pipeline errors and teardown reporting.

use std::any::Any;
use std::time::Duration;

/// Failures that end an ordered stream.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to spawn {stage} thread")]
    Spawn {
        stage: String,
        #[source]
        source: std::io::Error,
    },

    /// Nothing arrived from upstream for `waited` while index `expected` was still missing.
    #[error("pipeline stalled: no item received for {waited:?} while waiting for index {expected}")]
    Stalled { expected: u64, waited: Duration },

    /// Every upstream worker exited but index `expected` never arrived (a processor failed on it).
    #[error("pipeline incomplete: upstream closed at index {expected} of {total}")]
    Incomplete { expected: u64, total: u64 },

    #[error("aggregator exited without a completion or failure event")]
    AggregatorLost,
}

/// A worker that ended with an error or a panic instead of draining its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerFailure {
    /// Thread name, e.g. `post-3`.
    pub worker: String,
    pub reason: String,
}

impl std::fmt::Display for WorkerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.worker, self.reason)
    }
}

/// Turn a join result into a failure record (None when the worker finished cleanly).
pub fn failure_from_join(
    worker: &str,
    joined: std::thread::Result<anyhow::Result<()>>,
) -> Option<WorkerFailure> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(WorkerFailure {
            worker: worker.to_string(),
            reason: format!("{:#}", e),
        }),
        Err(panic) => Some(WorkerFailure {
            worker: worker.to_string(),
            reason: format!("panicked: {}", panic_message(panic.as_ref())),
        }),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

/// Log worker failures after teardown. Each one means at least one item was dropped.
pub fn report_worker_failures(failures: &[WorkerFailure]) {
    if failures.is_empty() {
        return;
    }
    log::warn!(
        "{} worker(s) exited early; their in-flight items were dropped",
        failures.len()
    );
    for f in failures {
        log::warn!("  {}", f);
    }
}
