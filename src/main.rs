//! ordfeed CLI: feed files through the ordered pipeline and report results in input order.

use anyhow::Result;
use clap::Parser;
use ordfeed::engine::arg_parser::Cli;
use ordfeed::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
