//! Feed run: list inputs, stream them through the loader, write the ordered report.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::engine::processors::build_chain;
use crate::engine::progress::ProgressTracker;
use crate::engine::report::{ReportStats, ReportWriter};
use crate::engine::tools::{list_inputs, read_manifest};
use crate::pipeline::report_worker_failures;
use crate::utils::Colors;
use crate::utils::config::StallConsts;
use crate::{FileLoader, LoaderOpts, Opts, Polled};

/// Ordered identifier list for `opts`: the manifest when set, otherwise the walked inputs.
pub fn collect_identifiers(opts: &Opts) -> Result<Vec<String>> {
    match opts.manifest {
        Some(ref manifest) => read_manifest(manifest),
        None => list_inputs(
            opts.inputs.as_slice(),
            &opts.extensions,
            &opts.exclude,
            opts.follow_links,
        ),
    }
}

/// First Ctrl+C asks the consumer to stop; a second one exits immediately.
fn install_cancel_handler() -> Arc<AtomicBool> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);
    if let Err(e) = ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
    }) {
        debug!("Ctrl+C handler not installed: {}", e);
    }
    cancelled
}

/// Run the whole feed for the CLI. Returns the report counts; a stalled or incomplete pipeline is
/// an error after the partial report was flushed.
pub fn feed_with_opts(opts: &Opts) -> Result<ReportStats> {
    let start = Instant::now();
    let identifiers = collect_identifiers(opts)?;
    if identifiers.is_empty() {
        warn!("No inputs found");
    }
    info!("Feeding {} items", identifiers.len());

    let chain = build_chain(opts.checksum, opts.content_type);
    let loader_opts = LoaderOpts::from(opts);
    let mut loader =
        FileLoader::new(identifiers, &loader_opts, chain).context("start pipeline")?;

    let mut report = ReportWriter::create(opts.output.as_deref(), opts.sidecar)?;
    let mut progress = ProgressTracker::new(loader.total() as usize, opts.verbose);
    let cancelled = install_cancel_handler();

    let mut outcome = Ok(());
    loop {
        if cancelled.load(Ordering::Relaxed) {
            info!("Cancelled (Ctrl+C); flushing partial report...");
            break;
        }
        match loader.poll_next(StallConsts::CANCEL_POLL_INTERVAL) {
            Polled::Ready(item) => {
                if let Err(e) = report.write_item(item) {
                    outcome = Err(e);
                    break;
                }
                progress.tick();
            }
            Polled::Pending => {}
            Polled::Failed(e) => {
                outcome = Err(anyhow::Error::new(e));
                break;
            }
            Polled::Done => break,
        }
    }
    progress.flush();
    let seen = progress.seen();
    drop(progress);

    let failures = loader.finish();
    report_worker_failures(&failures);
    let stats = report.finish()?;
    outcome?;

    print_summary(&stats, seen, start);
    Ok(stats)
}

fn print_summary(stats: &ReportStats, seen: usize, start: Instant) {
    info!(
        "{} | {} | {} in {:.2?}",
        Colors::colorize(Colors::OK, &format!("Written: {}", stats.written)),
        Colors::colorize(Colors::NULL, &format!("Null: {}", stats.null_payloads)),
        Colors::colorize(Colors::FLAGGED, &format!("Flagged: {}", stats.flagged)),
        start.elapsed()
    );
    debug!("consumer saw {} items", seen);
}
