//! The pipeline facade: an ordered iterator over a running pipeline.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::debug;
use std::time::Duration;

use crate::pipeline::{
    self, Event, PipelineError, Processor, StageHandle, WorkerFailure, report_worker_failures,
};
use crate::{Item, LoaderOpts};

/// Result of [`FileLoader::poll_next`].
#[derive(Debug)]
pub enum Polled {
    Ready(Item),
    /// The stream ended early; nothing follows.
    Failed(PipelineError),
    /// Nothing arrived within the wait; the pipeline is still running.
    Pending,
    /// Every item was yielded (or the loader was already finished).
    Done,
}

/// Streams `identifiers` through the pipeline and yields `(Meta, Payload)` in input order.
///
/// Iteration ends after the last item. If the pipeline fails (stall, lost items), the error is
/// yielded once and iteration ends. Dropping the loader, or calling [`finish`](Self::finish), joins
/// every worker thread; this is safe at any point, including before the stream was drained.
///
/// ```ignore
/// let opts = LoaderOpts { skip_read: true, ..Default::default() };
/// let upper = Processor::payload_only(|p| Ok(Payload::Identifier(p.as_identifier().unwrap_or("").to_uppercase())));
/// for item in FileLoader::new(["a.png", "b.png"], &opts, vec![upper])? {
///     let (meta, payload) = item?;
/// }
/// ```
pub struct FileLoader {
    out_rx: Option<Receiver<Event>>,
    stage_handles: Vec<StageHandle>,
    total: u64,
    done: bool,
}

impl FileLoader {
    /// Start every stage. `processors` empty means no post-processing stage.
    pub fn new<I, S>(
        identifiers: I,
        opts: &LoaderOpts,
        processors: Vec<Processor>,
    ) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identifiers: Vec<String> = identifiers.into_iter().map(Into::into).collect();
        let handles = pipeline::run_pipeline(identifiers, opts, processors)?;
        Ok(FileLoader {
            out_rx: Some(handles.out_rx),
            stage_handles: handles.stage_handles,
            total: handles.total,
            done: false,
        })
    }

    /// Number of inputs, i.e. items a complete run yields.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Stop consuming, join every worker, and return those that ended in error.
    pub fn finish(mut self) -> Vec<WorkerFailure> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Vec<WorkerFailure> {
        // Close our end first so an aggregator blocked on a full channel can exit; its exit
        // closes the channels behind it in turn.
        self.out_rx = None;
        self.done = true;
        let handles = std::mem::take(&mut self.stage_handles);
        if handles.is_empty() {
            return Vec::new();
        }
        debug!("joining {} stage threads", handles.len());
        pipeline::shutdown_pipeline_handles(handles)
    }
}

impl FileLoader {
    /// Like [`Iterator::next`] but waits at most `wait`, so the caller can check for
    /// cancellation while a slow item is still in flight.
    pub fn poll_next(&mut self, wait: Duration) -> Polled {
        if self.done {
            return Polled::Done;
        }
        let Some(rx) = self.out_rx.as_ref() else {
            return Polled::Done;
        };
        let event = match rx.recv_timeout(wait) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => return Polled::Pending,
            Err(RecvTimeoutError::Disconnected) => None,
        };
        match self.on_event(event) {
            Some(Ok(item)) => Polled::Ready(item),
            Some(Err(e)) => Polled::Failed(e),
            None => Polled::Done,
        }
    }

    /// Map one received event (None: channel closed) to an iterator step, marking the end.
    fn on_event(&mut self, event: Option<Event>) -> Option<Result<Item, PipelineError>> {
        match event {
            Some(Event::Item(meta, payload)) => Some(Ok((meta, payload))),
            Some(Event::Completed) => {
                self.done = true;
                None
            }
            Some(Event::Failed(e)) => {
                self.done = true;
                Some(Err(e))
            }
            None => {
                self.done = true;
                Some(Err(PipelineError::AggregatorLost))
            }
        }
    }
}

impl Iterator for FileLoader {
    type Item = Result<Item, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let event = self.out_rx.as_ref()?.recv().ok();
        self.on_event(event)
    }
}

impl Drop for FileLoader {
    fn drop(&mut self) {
        let failures = self.shutdown();
        report_worker_failures(&failures);
    }
}
