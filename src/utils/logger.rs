use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;

const PKG: &str = env!("CARGO_PKG_NAME");

/// Install the global logger. Dependencies log at warn; ordfeed at info, or debug when verbose.
/// A second call is a no-op (tests and embedding programs may already own the logger).
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(PKG, level)
        .format(|buf, record| writeln!(buf, "{}", format_record(record)))
        .try_init();
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Error => "ERROR".red(),
        Level::Warn => "WARN".yellow(),
        Level::Info => "INFO".normal(),
        Level::Debug => "DEBUG".dimmed(),
        Level::Trace => "TRACE".dimmed(),
    }
}

/// Warnings and errors name their module; debug lines name the stage thread (`reader-0`, `post-3`,
/// `aggregator`) so interleaved worker output stays readable.
fn format_record(record: &Record<'_>) -> String {
    match record.level() {
        Level::Error | Level::Warn => format!(
            "[{} {} {}] {}",
            PKG.cyan(),
            level_tag(record.level()),
            record.target().white(),
            record.args()
        ),
        Level::Debug | Level::Trace => {
            let thread = std::thread::current();
            format!(
                "[{} {}] {}",
                PKG.cyan(),
                thread.name().unwrap_or("main").dimmed(),
                record.args()
            )
        }
        Level::Info => format!("[{}] {}", PKG.cyan(), record.args()),
    }
}

/// Colours for the run summary.
pub struct Colors;

impl Colors {
    pub const OK: &'static str = "green";
    pub const NULL: &'static str = "yellow";
    pub const FLAGGED: &'static str = "red";

    pub fn colorize(color: &str, text: &str) -> String {
        text.color(color).to_string()
    }
}
