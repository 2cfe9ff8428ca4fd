//! Post-processing stage: a pool applying the caller's processor chain to each item.

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::fmt;
use std::sync::Arc;

use super::context::StageHandle;
use super::error_handler::PipelineError;
use crate::{Item, Meta, Payload};

pub type PayloadFn = dyn Fn(Payload) -> Result<Payload> + Send + Sync;
pub type MetaFn = dyn Fn(Meta, Payload) -> Result<(Meta, Payload)> + Send + Sync;

/// One step of the processing chain. The variant decides whether the step can see and rewrite
/// [`Meta`]; it is fixed when the chain is built.
#[derive(Clone)]
pub enum Processor {
    PayloadOnly(Arc<PayloadFn>),
    MetaAndPayload(Arc<MetaFn>),
}

impl Processor {
    pub fn payload_only<F>(f: F) -> Self
    where
        F: Fn(Payload) -> Result<Payload> + Send + Sync + 'static,
    {
        Processor::PayloadOnly(Arc::new(f))
    }

    pub fn with_meta<F>(f: F) -> Self
    where
        F: Fn(Meta, Payload) -> Result<(Meta, Payload)> + Send + Sync + 'static,
    {
        Processor::MetaAndPayload(Arc::new(f))
    }

    pub fn apply(&self, meta: Meta, payload: Payload) -> Result<Item> {
        match self {
            Processor::PayloadOnly(f) => Ok((meta, f(payload)?)),
            Processor::MetaAndPayload(f) => f(meta, payload),
        }
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processor::PayloadOnly(_) => f.write_str("PayloadOnly(..)"),
            Processor::MetaAndPayload(_) => f.write_str("MetaAndPayload(..)"),
        }
    }
}

/// Run `item` through every step in order.
pub fn apply_chain(chain: &[Processor], item: Item) -> Result<Item> {
    let (mut meta, mut payload) = item;
    for (step, p) in chain.iter().enumerate() {
        let identifier = meta.identifier.clone();
        (meta, payload) = p
            .apply(meta, payload)
            .with_context(|| format!("step {step} failed on {identifier}"))?;
    }
    Ok((meta, payload))
}

/// Single post-processor. A failing step ends this worker and drops the item; the error is
/// returned so teardown can report it.
fn post_process_loop(
    item_rx: Receiver<Item>,
    out_tx: Sender<Item>,
    chain: Arc<[Processor]>,
) -> Result<()> {
    while let Ok(item) = item_rx.recv() {
        let index = item.0.index;
        let processed = apply_chain(&chain, item)?;
        debug!("processed {}", index);
        if out_tx.send(processed).is_err() {
            debug!("aggregator gone; post-processor exiting");
            break;
        }
    }
    Ok(())
}

/// Spawn `num_workers` post-processors sharing one immutable chain.
pub fn spawn_post_workers(
    item_rx: Receiver<Item>,
    out_tx: &Sender<Item>,
    num_workers: usize,
    chain: Vec<Processor>,
) -> Result<Vec<StageHandle>, PipelineError> {
    let chain: Arc<[Processor]> = chain.into();
    (0..num_workers)
        .map(|i| {
            let item_rx = item_rx.clone();
            let out_tx = out_tx.clone();
            let chain = Arc::clone(&chain);
            StageHandle::spawn(format!("post-{i}"), move || {
                post_process_loop(item_rx, out_tx, chain)
            })
        })
        .collect()
}
