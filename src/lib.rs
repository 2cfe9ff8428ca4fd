//! ordfeed: ordered parallel file ingestion.
//!
//! Inputs are enumerated, read by a pool of reader threads, optionally post-processed by a second
//! pool, and reassembled into input order by a single aggregator. Stages talk only through bounded
//! channels, so a slow consumer throttles everything upstream.

pub mod engine;
pub mod feed;
pub mod loader;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::tools::{list_inputs, read_manifest};
pub use loader::{FileLoader, Polled};
pub use pipeline::{PipelineError, Processor, WorkerFailure};

use log::debug;

/// Result alias used by public ordfeed API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Run `identifiers` through the pipeline and collect every item in input order.
///
/// Fails if the pipeline stalls or loses items. Workers that died are logged; a worker failure
/// without a lost item (it failed after its last send) does not fail the call.
///
/// ```ignore
/// let opts = LoaderOpts { skip_read: true, ..Default::default() };
/// let upper = Processor::payload_only(|p| match p {
///     Payload::Identifier(s) => Ok(Payload::Identifier(s.to_uppercase())),
///     other => Ok(other),
/// });
/// let items = ordfeed::load_ordered(vec!["a.png", "b.png"], &opts, vec![upper])?;
/// ```
pub fn load_ordered<I, S>(
    identifiers: I,
    opts: &LoaderOpts,
    processors: Vec<Processor>,
) -> Result<Vec<Item>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut loader = FileLoader::new(identifiers, opts, processors)?;
    let mut items = Vec::with_capacity(loader.total() as usize);
    let mut failed = None;
    for item in loader.by_ref() {
        match item {
            Ok(item) => items.push(item),
            Err(e) => {
                failed = Some(e);
                break;
            }
        }
    }
    let failures = loader.finish();
    pipeline::report_worker_failures(&failures);
    if let Some(e) = failed {
        return Err(e.into());
    }
    debug!("collected {} ordered items", items.len());
    Ok(items)
}
