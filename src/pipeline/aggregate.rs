//! Order-restoring aggregator: the single point where out-of-order completions are put back in
//! input order.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::time::Duration;

use super::context::StageHandle;
use super::error_handler::PipelineError;
use crate::{Item, Meta, Payload};

/// What the aggregator sends to the consumer.
#[derive(Debug)]
pub enum Event {
    Item(Meta, Payload),
    /// Completion sentinel: every index was emitted. Sent exactly once, last.
    Completed,
    /// The stream ended early; sent instead of `Completed`.
    Failed(PipelineError),
}

/// Holds items that arrived before their turn, keyed by index.
#[derive(Debug, Default)]
pub struct ReassemblyBuffer {
    expected: u64,
    pending: HashMap<u64, Item>,
}

impl ReassemblyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index to emit.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Buffer an item. Returns false (and drops it) if its index was already emitted or is
    /// already buffered.
    pub fn insert(&mut self, item: Item) -> bool {
        let index = item.0.index;
        if index < self.expected || self.pending.contains_key(&index) {
            return false;
        }
        self.pending.insert(index, item);
        true
    }

    /// Remove and return the item for the expected index, advancing it.
    pub fn pop_next(&mut self) -> Option<Item> {
        let item = self.pending.remove(&self.expected)?;
        self.expected += 1;
        Some(item)
    }
}

pub fn spawn_aggregator_thread(
    upstream_rx: Receiver<Item>,
    out_tx: Sender<Event>,
    credit_rx: Option<Receiver<()>>,
    total: u64,
    stall_timeout: Duration,
) -> Result<StageHandle, PipelineError> {
    StageHandle::spawn("aggregator".to_string(), move || {
        run_aggregator(upstream_rx, out_tx, credit_rx, total, stall_timeout);
        Ok(())
    })
}

/// Receive from upstream, emit in index order, then send `Completed` once `total` items went out.
/// Sends `Failed` on stall (nothing received within `stall_timeout`) or when upstream closes
/// with an index missing. Returns early if the consumer is gone.
pub fn run_aggregator(
    upstream_rx: Receiver<Item>,
    out_tx: Sender<Event>,
    credit_rx: Option<Receiver<()>>,
    total: u64,
    stall_timeout: Duration,
) {
    let mut buffer = ReassemblyBuffer::new();

    while buffer.expected() < total {
        let item = match upstream_rx.recv_timeout(stall_timeout) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => {
                error!(
                    "Timeout reached: nothing received for {:?} (waiting on index {}, {} buffered)",
                    stall_timeout,
                    buffer.expected(),
                    buffer.pending_len()
                );
                let _ = out_tx.send(Event::Failed(PipelineError::Stalled {
                    expected: buffer.expected(),
                    waited: stall_timeout,
                }));
                return;
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!(
                    "Upstream closed at index {} of {} ({} buffered)",
                    buffer.expected(),
                    total,
                    buffer.pending_len()
                );
                let _ = out_tx.send(Event::Failed(PipelineError::Incomplete {
                    expected: buffer.expected(),
                    total,
                }));
                return;
            }
        };

        let index = item.0.index;
        if !buffer.insert(item) {
            warn!("Discarding duplicate or stale index {}", index);
            continue;
        }

        while let Some((meta, payload)) = buffer.pop_next() {
            debug!("emit {} {}", meta.index, meta.identifier);
            if out_tx.send(Event::Item(meta, payload)).is_err() {
                debug!("consumer gone; aggregator exiting");
                return;
            }
            if let Some(ref credits) = credit_rx {
                let _ = credits.try_recv();
            }
        }
    }

    debug!("all {} items emitted", total);
    let _ = out_tx.send(Event::Completed);
}
