//! Public and internal types for the ordfeed API and pipeline.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::config::{QueueCaps, StallConsts, WorkerThreadLimits};

/// One unit of work as produced by the enumerator. Created once per input, never modified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// 0-based rank of the item in the input list.
    pub index: u64,
    /// Usually a file path.
    pub identifier: String,
    /// Input list length; the same on every descriptor.
    pub total: u64,
}

/// Per-item metadata carried alongside the payload through every stage.
///
/// `extra` is where stages attach side information (`read_error`, `error`, `content_type`, ...).
/// Only [`Processor::MetaAndPayload`](crate::pipeline::Processor::MetaAndPayload) steps can change it after the read stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Meta {
    pub index: u64,
    pub identifier: String,
    pub total: u64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl From<TaskDescriptor> for Meta {
    fn from(t: TaskDescriptor) -> Self {
        Meta {
            index: t.index,
            identifier: t.identifier,
            total: t.total,
            extra: Map::new(),
        }
    }
}

impl Meta {
    /// Attach (or replace) a side value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.extra.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// True when any stage flagged this item with an `error` value.
    pub fn has_error(&self) -> bool {
        self.extra.contains_key("error")
    }
}

/// The data travelling with an item. Its shape changes at stage boundaries: the read stage
/// produces `Bytes` (or `Identifier` in skip-read mode), processors usually produce `Json`.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// The read failed; the item still flows so the output keeps every index.
    Null,
    Bytes(Vec<u8>),
    Identifier(String),
    Json(Value),
}

impl Payload {
    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Payload::Identifier(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// One ordered output element.
pub type Item = (Meta, Payload);

/// Pipeline options for [`FileLoader`](crate::FileLoader). All fields are per instance; nothing is process-global.
#[derive(Clone, Debug)]
pub struct LoaderOpts {
    /// Reader pool size. Capped by the open-file limit at startup.
    pub readers: usize,
    /// Post-processing pool size. When None, uses all available threads. Ignored without processors.
    pub workers: Option<usize>,
    /// Pass the identifier through as the payload instead of reading the file.
    pub skip_read: bool,
    /// Capacity of the enumerator -> reader channel.
    pub input_cap: usize,
    /// Capacity of the reader -> processor and processor -> aggregator channels.
    pub intermediate_cap: usize,
    /// Capacity of the aggregator -> consumer channel.
    pub output_cap: usize,
    /// Aggregator fails the pipeline after receiving nothing for this long.
    pub stall_timeout: Duration,
    /// Max distance between the next index to emit and the newest enumerated index.
    /// None leaves the reorder buffer unbounded.
    pub reorder_window: Option<usize>,
}

impl Default for LoaderOpts {
    fn default() -> Self {
        LoaderOpts {
            readers: WorkerThreadLimits::DEFAULT_READERS,
            workers: None,
            skip_read: false,
            input_cap: QueueCaps::INPUT,
            intermediate_cap: QueueCaps::INTERMEDIATE,
            output_cap: QueueCaps::OUTPUT,
            stall_timeout: StallConsts::STALL_TIMEOUT,
            reorder_window: Some(QueueCaps::REORDER_WINDOW),
        }
    }
}

impl From<&Opts> for LoaderOpts {
    fn from(o: &Opts) -> Self {
        LoaderOpts {
            readers: o.readers,
            workers: o.workers,
            skip_read: o.skip_read,
            input_cap: o.input_cap,
            intermediate_cap: o.intermediate_cap,
            output_cap: o.output_cap,
            stall_timeout: o.stall_timeout,
            reorder_window: o.reorder_window,
        }
    }
}

/// Full options (CLI). Use [`LoaderOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    /// Files or directories to feed. Directories are walked recursively.
    pub inputs: Vec<PathBuf>,
    /// File with one identifier per line; used instead of walking `inputs` when set.
    pub manifest: Option<PathBuf>,
    /// Keep only files with these extensions (no leading dot, case-insensitive). Empty keeps all.
    pub extensions: Vec<String>,
    /// Exclude patterns (glob syntax, e.g. `*.tmp`, `thumbs`).
    pub exclude: Vec<String>,
    /// Follow symbolic links while walking.
    pub follow_links: bool,
    pub readers: usize,
    pub workers: Option<usize>,
    pub skip_read: bool,
    pub input_cap: usize,
    pub intermediate_cap: usize,
    pub output_cap: usize,
    pub stall_timeout: Duration,
    pub reorder_window: Option<usize>,
    /// Add the blake3 checksum step.
    pub checksum: bool,
    /// Add the content-type classification step.
    pub content_type: bool,
    /// Report destination. When None, JSON lines go to stdout.
    pub output: Option<PathBuf>,
    /// Also write `<identifier>.json` next to each input.
    pub sidecar: bool,
    /// Show progress bar and debug logging.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        let loader = LoaderOpts::default();
        Opts {
            inputs: Vec::new(),
            manifest: None,
            extensions: Vec::new(),
            exclude: Vec::new(),
            follow_links: false,
            readers: loader.readers,
            workers: loader.workers,
            skip_read: loader.skip_read,
            input_cap: loader.input_cap,
            intermediate_cap: loader.intermediate_cap,
            output_cap: loader.output_cap,
            stall_timeout: loader.stall_timeout,
            reorder_window: loader.reorder_window,
            checksum: false,
            content_type: false,
            output: None,
            sidecar: false,
            verbose: false,
        }
    }
}
