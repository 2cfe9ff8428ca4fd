//! Task enumerator: turns the ordered identifier list into indexed descriptors.

use crossbeam_channel::Sender;
use log::debug;

use super::context::StageHandle;
use super::error_handler::PipelineError;
use crate::TaskDescriptor;

/// Descriptors for `identifiers` in input order, each carrying the list length as `total`.
pub fn enumerate_tasks(identifiers: Vec<String>) -> impl Iterator<Item = TaskDescriptor> {
    let total = identifiers.len() as u64;
    identifiers
        .into_iter()
        .enumerate()
        .map(move |(index, identifier)| TaskDescriptor {
            index: index as u64,
            identifier,
            total,
        })
}

pub fn spawn_enumerator_thread(
    identifiers: Vec<String>,
    task_tx: Sender<TaskDescriptor>,
    credit_tx: Option<Sender<()>>,
) -> Result<StageHandle, PipelineError> {
    StageHandle::spawn("enumerator".to_string(), move || {
        let sent = run_enumerate_loop(identifiers, task_tx, credit_tx);
        debug!("enumerator: queued {} tasks", sent);
        Ok(())
    })
}

/// Send every descriptor to `task_tx`, blocking on backpressure. With `credit_tx`, first take one
/// reorder-window credit per task. Returns the count sent; stops early if the readers or the
/// aggregator are gone. Dropping `task_tx` on return is the end-of-stream signal for readers.
pub fn run_enumerate_loop(
    identifiers: Vec<String>,
    task_tx: Sender<TaskDescriptor>,
    credit_tx: Option<Sender<()>>,
) -> usize {
    let mut count = 0_usize;
    for task in enumerate_tasks(identifiers) {
        if let Some(ref credits) = credit_tx
            && credits.send(()).is_err()
        {
            debug!("enumerator: aggregator gone at index {}", task.index);
            break;
        }
        if task_tx.send(task).is_err() {
            debug!("enumerator: readers gone after {} tasks", count);
            break;
        }
        count += 1;
    }
    drop(task_tx);
    count
}
