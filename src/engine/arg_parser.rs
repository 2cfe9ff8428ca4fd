use clap::Parser;
use std::path::PathBuf;

/// Ordered parallel file ingestion.
#[derive(Clone, Debug, Parser)]
#[command(name = "ordfeed")]
#[command(
    about = "Read files with a worker pool, post-process them in parallel, and report results in input order."
)]
pub struct Cli {
    /// Files or directories to feed. Directories are walked recursively and natural-sorted.
    #[arg(value_name = "INPUT", required_unless_present = "manifest")]
    pub inputs: Vec<PathBuf>,

    /// Read identifiers from FILE (one per line) instead of walking INPUTs.
    #[arg(long, value_name = "FILE", conflicts_with = "inputs")]
    pub manifest: Option<PathBuf>,

    /// Keep only files with these extensions. Can specify multiple: -x png -x jpg
    #[arg(long = "ext", short = 'x')]
    pub extensions: Vec<String>,

    /// Exclude patterns (glob syntax). Can specify multiple: -e pattern1 pattern2 pattern3
    #[arg(long, short = 'e', num_args = 1..)]
    pub exclude: Vec<String>,

    /// Follow symbolic links while walking.
    #[arg(long, short = 'f', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub follow_links: Option<bool>,

    /// Reader threads.
    #[arg(long, short = 'r')]
    pub readers: Option<usize>,

    /// Post-processing threads. Default: all available.
    #[arg(long, short = 'w')]
    pub workers: Option<usize>,

    /// Do not read files; pass each path to the processing steps instead.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub skip_read: Option<bool>,

    /// Add a blake3 checksum step.
    #[arg(long, short = 'c', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub checksum: Option<bool>,

    /// Add a content-type step; unknown types are flagged with an error.
    #[arg(long, short = 't', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub content_type: Option<bool>,

    /// Fail when nothing completes for this many seconds (at least 1).
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Max items in flight ahead of the next one to report. 0 = unbounded.
    #[arg(long)]
    pub window: Option<usize>,

    /// Write the JSON-lines report to FILE instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write `<input>.json` next to each input.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub sidecar: Option<bool>,

    /// Verbose output.
    #[arg(long, short = 'v', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,
}
