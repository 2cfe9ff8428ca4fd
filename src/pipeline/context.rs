//! Pipeline context and tuning: channels between stages and the resolved pool sizes.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::thread::{self, JoinHandle};

use crate::pipeline::aggregate::Event;
use crate::pipeline::error_handler::{PipelineError, WorkerFailure, failure_from_join};
use crate::utils::config::WorkerThreadLimits;
use crate::utils::fd_limit::cap_readers;
use crate::{Item, LoaderOpts, TaskDescriptor};

/// Pool sizes and channel caps resolved from [`LoaderOpts`] at startup.
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub readers: usize,
    /// 0 when no processors were given (no post-processing stage).
    pub workers: usize,
    pub skip_read: bool,
    pub input_cap: usize,
    pub intermediate_cap: usize,
    pub output_cap: usize,
    pub reorder_window: Option<usize>,
}

impl PipelineTuning {
    /// Validate `opts` and resolve defaults. `with_processors` decides whether a post-processing pool exists.
    pub fn resolve(opts: &LoaderOpts, with_processors: bool) -> Result<Self, PipelineError> {
        if opts.readers == 0 {
            return Err(PipelineError::InvalidConfig(
                "readers must be at least 1".into(),
            ));
        }
        for (name, cap) in [
            ("input_cap", opts.input_cap),
            ("intermediate_cap", opts.intermediate_cap),
            ("output_cap", opts.output_cap),
        ] {
            if cap == 0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if opts.reorder_window == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "reorder_window must be at least 1".into(),
            ));
        }
        if opts.stall_timeout.is_zero() {
            return Err(PipelineError::InvalidConfig(
                "stall_timeout must be greater than zero".into(),
            ));
        }

        let limits = WorkerThreadLimits::current();
        let workers = if with_processors {
            opts.workers
                .filter(|w| *w > 0)
                .unwrap_or(limits.all_threads)
                .max(limits.floor)
        } else {
            0
        };

        Ok(PipelineTuning {
            readers: cap_readers(opts.readers),
            workers,
            skip_read: opts.skip_read,
            input_cap: opts.input_cap,
            intermediate_cap: opts.intermediate_cap,
            output_cap: opts.output_cap,
            reorder_window: opts.reorder_window,
        })
    }
}

/// A running stage thread. Every stage returns `anyhow::Result<()>` so teardown can report failures uniformly.
pub struct StageHandle {
    pub name: String,
    pub handle: JoinHandle<anyhow::Result<()>>,
}

impl StageHandle {
    /// Spawn a named stage thread.
    pub fn spawn<F>(name: String, f: F) -> Result<Self, PipelineError>
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|source| PipelineError::Spawn {
                stage: name.clone(),
                source,
            })?;
        Ok(StageHandle { name, handle })
    }

    /// Block until the thread exits.
    pub fn join(self) -> Option<WorkerFailure> {
        failure_from_join(&self.name, self.handle.join())
    }
}

/// Handles returned by [`run_pipeline`](crate::pipeline::run_pipeline): the ordered event stream and every stage thread.
pub struct PipelineHandles {
    pub out_rx: Receiver<Event>,
    pub stage_handles: Vec<StageHandle>,
    pub total: u64,
}

/// Channels for one pipeline instance. Each stage takes the ends it needs; whatever is left
/// is dropped by the orchestrator so that closing propagates downstream.
pub struct PipelineChannels {
    pub task_tx: Sender<TaskDescriptor>,
    pub task_rx: Receiver<TaskDescriptor>,
    pub read_tx: Sender<Item>,
    pub read_rx: Receiver<Item>,
    /// Present only with a post-processing stage.
    pub processed: Option<(Sender<Item>, Receiver<Item>)>,
    pub out_tx: Sender<Event>,
    pub out_rx: Receiver<Event>,
    /// Reorder window credits: the enumerator sends one per task, the aggregator takes one per emitted item.
    pub credits: Option<(Sender<()>, Receiver<()>)>,
}

pub fn create_pipeline_channels(tuning: &PipelineTuning) -> PipelineChannels {
    let (task_tx, task_rx) = bounded::<TaskDescriptor>(tuning.input_cap);
    let (read_tx, read_rx) = bounded::<Item>(tuning.intermediate_cap);
    let processed = (tuning.workers > 0).then(|| bounded::<Item>(tuning.intermediate_cap));
    let (out_tx, out_rx) = bounded::<Event>(tuning.output_cap);
    let credits = tuning.reorder_window.map(bounded::<()>);

    PipelineChannels {
        task_tx,
        task_rx,
        read_tx,
        read_rx,
        processed,
        out_tx,
        out_rx,
        credits,
    }
}
