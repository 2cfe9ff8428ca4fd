//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;
use std::time::Duration;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    config_filename: String,
    sidecar_extension: &'static str,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                config_filename: format!(".{pkg}.toml"),
                sidecar_extension: "json",
            }
        })
    }

    /// Name of the optional settings file looked up in the working directory.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Extension appended to an identifier when writing a per-item sidecar (`a.png` -> `a.png.json`).
    pub fn sidecar_extension(&self) -> &str {
        self.sidecar_extension
    }
}

// ---- Worker threads ----

/// Worker pool sizing.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Floor for any pool.
    pub floor: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const DEFAULT_READERS: usize = 2;
    pub const FLOOR_THREADS: usize = 1;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    /// Post-processing pools default to this value.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }
}

// ---- Queues ----

/// Bounded channel capacities between stages. Sized to bound peak memory while leaving
/// enough items in flight to hide read latency.
pub struct QueueCaps;

impl QueueCaps {
    /// Enumerator -> readers.
    pub const INPUT: usize = 500;
    /// Readers -> post-processors, and post-processors -> aggregator.
    pub const INTERMEDIATE: usize = 500;
    /// Aggregator -> consumer.
    pub const OUTPUT: usize = 5000;
    /// Max gap between the next index to emit and the newest enumerated index.
    pub const REORDER_WINDOW: usize = 10_000;
}

// ---- Aggregator ----

pub struct StallConsts;

impl StallConsts {
    /// Aggregator gives up after receiving nothing from upstream for this long.
    pub const STALL_TIMEOUT: Duration = Duration::from_secs(60);
    /// How often the CLI consumer wakes to check for Ctrl+C while waiting on the next item.
    pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);
}

// ---- Progress ----

pub struct ProgressConsts;

impl ProgressConsts {
    /// Items between progress bar redraws.
    pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 50;
}

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}
