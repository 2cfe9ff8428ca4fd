//! Engine module: CLI handling, input listing, built-in processing steps, report output

pub mod arg_parser;
pub mod cli;
pub mod hashing;
pub mod processors;
pub mod progress;
pub mod report;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::{handle_run, setup_opts};
pub use hashing::{hash_bytes, hash_file, to_hex};
pub use processors::{build_chain, checksum, content_type, content_type_for, summarize};
pub use report::{ReportStats, ReportWriter};
pub use tools::{
    glob_match, has_extension, is_os_hidden_file, list_inputs, natural_cmp, natural_sort,
    parse_manifest, read_manifest, should_include_in_walk,
};
