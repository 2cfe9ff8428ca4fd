//! CLI command handler: defaults < `.ordfeed.toml` < flags, then feed.

use anyhow::Result;
use log::debug;
use std::path::Path;
use std::time::Duration;

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::feed::feed_with_opts;
use crate::utils::ordfeed_toml::{OrdfeedToml, apply_file_to_opts, load_ordfeed_toml, window_from};
use crate::utils::setup_logging;

/// Overwrite opts field from a CLI flag when given.
macro_rules! apply_cli_opt {
    ($cli:expr, $opts:expr, $cli_field:ident => $opts_field:ident) => {
        if let Some(v) = $cli.$cli_field {
            $opts.$opts_field = v;
        }
    };
}

/// Resolve options. `file` is the parsed settings file, if any.
pub fn setup_opts(cli: &Cli, file: Option<&OrdfeedToml>) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = file {
        apply_file_to_opts(file, &mut opts);
    }

    opts.inputs = cli.inputs.clone();
    opts.manifest = cli.manifest.clone();
    if !cli.extensions.is_empty() {
        opts.extensions = cli.extensions.clone();
    }
    if !cli.exclude.is_empty() {
        opts.exclude = cli.exclude.clone();
    }
    apply_cli_opt!(cli, opts, follow_links => follow_links);
    apply_cli_opt!(cli, opts, readers => readers);
    if cli.workers.is_some() {
        opts.workers = cli.workers;
    }
    apply_cli_opt!(cli, opts, skip_read => skip_read);
    apply_cli_opt!(cli, opts, checksum => checksum);
    apply_cli_opt!(cli, opts, content_type => content_type);
    if let Some(secs) = cli.timeout {
        opts.stall_timeout = Duration::from_secs(secs);
    }
    if let Some(n) = cli.window {
        opts.reorder_window = window_from(n);
    }
    if cli.output.is_some() {
        opts.output = cli.output.clone();
    }
    apply_cli_opt!(cli, opts, sidecar => sidecar);
    apply_cli_opt!(cli, opts, verbose => verbose);
    opts
}

/// Load settings, set up logging, run the feed.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let file = load_ordfeed_toml(Path::new("."));
    let opts = setup_opts(cli, file.as_ref());
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded settings file");
    }
    feed_with_opts(&opts)?;
    Ok(())
}
