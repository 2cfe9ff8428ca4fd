//! Pipeline components: enumerator, readers, post-processors, aggregator, and their wiring.

pub mod aggregate;
pub mod context;
pub mod enumerate;
pub mod error_handler;
pub mod orchestrator;
pub mod process;
pub mod reader;

pub use aggregate::{Event, ReassemblyBuffer, run_aggregator, spawn_aggregator_thread};
pub use context::{
    PipelineChannels, PipelineHandles, PipelineTuning, StageHandle, create_pipeline_channels,
};
pub use enumerate::{enumerate_tasks, run_enumerate_loop, spawn_enumerator_thread};
pub use error_handler::{PipelineError, WorkerFailure, report_worker_failures};
pub use orchestrator::{run_pipeline, shutdown_pipeline_handles};
pub use process::{Processor, apply_chain, spawn_post_workers};
pub use reader::{read_file, resolve_task, spawn_reader_workers};
