use crossbeam_channel::{Receiver, Sender};
use log::debug;
use std::path::Path;

use super::context::StageHandle;
use super::error_handler::PipelineError;
use crate::{Item, Meta, Payload, TaskDescriptor};

/// Single reader: take descriptors from task_rx until the enumerator closes it, resolve each to a
/// payload, send on item_tx. A failed read still sends the item with a `Null` payload.
fn reader_worker_loop(task_rx: Receiver<TaskDescriptor>, item_tx: Sender<Item>, skip_read: bool) {
    while let Ok(task) = task_rx.recv() {
        debug!("read {}: {}", task.index, task.identifier);
        if item_tx.send(resolve_task(task, skip_read)).is_err() {
            debug!("downstream gone; reader exiting");
            break;
        }
    }
    drop(item_tx);
}

/// Spawn `num_readers` readers. Caller must drop its own task sender and item sender afterwards so
/// closing propagates.
pub fn spawn_reader_workers(
    task_rx: Receiver<TaskDescriptor>,
    item_tx: &Sender<Item>,
    num_readers: usize,
    skip_read: bool,
) -> Result<Vec<StageHandle>, PipelineError> {
    (0..num_readers)
        .map(|i| {
            let task_rx = task_rx.clone();
            let item_tx = item_tx.clone();
            StageHandle::spawn(format!("reader-{i}"), move || {
                reader_worker_loop(task_rx, item_tx, skip_read);
                Ok(())
            })
        })
        .collect()
}

/// Turn one descriptor into `(Meta, Payload)`. Skip-read passes the identifier through.
pub fn resolve_task(task: TaskDescriptor, skip_read: bool) -> Item {
    let mut meta = Meta::from(task);
    if skip_read {
        let payload = Payload::Identifier(meta.identifier.clone());
        return (meta, payload);
    }
    match read_file(Path::new(&meta.identifier)) {
        Ok(bytes) => (meta, Payload::Bytes(bytes)),
        Err(e) => {
            debug!("read failed for {}: {}", meta.identifier, e);
            meta.set("read_error", e.to_string());
            (meta, Payload::Null)
        }
    }
}

/// Read a whole file into memory.
pub fn read_file(path: &Path) -> std::io::Result<Vec<u8>> {
    std::fs::read(path)
}
