use log::debug;

use crate::LoaderOpts;
use crate::pipeline::{self, PipelineError, PipelineTuning, Processor, StageHandle, WorkerFailure};

/// Start enumerator, readers, optional post-processors and the aggregator. Returns the ordered
/// event receiver and every stage handle; caller drains `out_rx` and must join the handles
/// ([`shutdown_pipeline_handles`]) when done.
///
/// Enumerator → task channel → readers → read channel → [post-processors → processed channel →]
/// aggregator → out channel.
pub fn run_pipeline(
    identifiers: Vec<String>,
    opts: &LoaderOpts,
    processors: Vec<Processor>,
) -> Result<pipeline::PipelineHandles, PipelineError> {
    let tuning = PipelineTuning::resolve(opts, !processors.is_empty())?;
    debug!("pipeline tuning: {:?}", tuning);

    let total = identifiers.len() as u64;
    let channels = pipeline::create_pipeline_channels(&tuning);
    let (credit_tx, credit_rx) = channels.credits.unzip();
    let mut stage_handles = Vec::with_capacity(tuning.readers + tuning.workers + 2);

    stage_handles.push(pipeline::spawn_enumerator_thread(
        identifiers,
        channels.task_tx,
        credit_tx,
    )?);

    stage_handles.extend(pipeline::spawn_reader_workers(
        channels.task_rx,
        &channels.read_tx,
        tuning.readers,
        tuning.skip_read,
    )?);
    // Readers hold the only senders now; when they all exit the next stage sees the channel close.
    drop(channels.read_tx);

    let upstream_rx = match channels.processed {
        Some((processed_tx, processed_rx)) => {
            stage_handles.extend(pipeline::spawn_post_workers(
                channels.read_rx,
                &processed_tx,
                tuning.workers,
                processors,
            )?);
            drop(processed_tx);
            processed_rx
        }
        None => channels.read_rx,
    };

    stage_handles.push(pipeline::spawn_aggregator_thread(
        upstream_rx,
        channels.out_tx,
        credit_rx,
        total,
        opts.stall_timeout,
    )?);

    debug!(
        "pipeline started: {} items, {} readers, {} post-processors",
        total, tuning.readers, tuning.workers
    );

    Ok(pipeline::PipelineHandles {
        out_rx: channels.out_rx,
        stage_handles,
        total,
    })
}

/// Join every stage thread. Call after the out receiver was drained or dropped, otherwise a
/// stage blocked on a full channel never exits. Returns the workers that ended in error.
pub fn shutdown_pipeline_handles(stage_handles: Vec<StageHandle>) -> Vec<WorkerFailure> {
    stage_handles
        .into_iter()
        .filter_map(StageHandle::join)
        .collect()
}
