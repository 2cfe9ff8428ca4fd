//! Load `.ordfeed.toml` from a directory (CLI only). Lib callers pass [`LoaderOpts`](crate::LoaderOpts) directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct OrdfeedToml {
    #[serde(default)]
    settings: Settings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Settings {
    readers: Option<usize>,
    workers: Option<usize>,
    skip_read: Option<bool>,
    checksum: Option<bool>,
    content_type: Option<bool>,
    /// Seconds.
    timeout: Option<u64>,
    /// 0 = unbounded.
    window: Option<usize>,
    input_cap: Option<usize>,
    intermediate_cap: Option<usize>,
    output_cap: Option<usize>,
    extensions: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    follow_links: Option<bool>,
    output: Option<String>,
    sidecar: Option<bool>,
    verbose: Option<bool>,
}

/// Load the settings file from `dir` if present. Returns None if missing or invalid (invalid is logged).
pub fn load_ordfeed_toml(dir: &Path) -> Option<OrdfeedToml> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_ordfeed_toml(&s)
        .map_err(|e| log::warn!("{}: {}", path.display(), e))
        .ok()
}

pub fn parse_ordfeed_toml(s: &str) -> Result<OrdfeedToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($src:expr, $opts:expr, $src_field:ident => $opts_field:ident) => {
        if let Some(v) = $src.$src_field.clone() {
            $opts.$opts_field = v;
        }
    };
}

/// Window value from file or CLI: 0 turns the bound off.
pub fn window_from(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &OrdfeedToml, opts: &mut Opts) {
    let s = &file.settings;
    apply_file_opt!(s, opts, readers => readers);
    if let Some(w) = s.workers {
        opts.workers = Some(w);
    }
    apply_file_opt!(s, opts, skip_read => skip_read);
    apply_file_opt!(s, opts, checksum => checksum);
    apply_file_opt!(s, opts, content_type => content_type);
    if let Some(secs) = s.timeout {
        opts.stall_timeout = Duration::from_secs(secs);
    }
    if let Some(n) = s.window {
        opts.reorder_window = window_from(n);
    }
    apply_file_opt!(s, opts, input_cap => input_cap);
    apply_file_opt!(s, opts, intermediate_cap => intermediate_cap);
    apply_file_opt!(s, opts, output_cap => output_cap);
    apply_file_opt!(s, opts, extensions => extensions);
    apply_file_opt!(s, opts, exclude => exclude);
    apply_file_opt!(s, opts, follow_links => follow_links);
    if let Some(ref p) = s.output {
        opts.output = Some(PathBuf::from(p));
    }
    apply_file_opt!(s, opts, sidecar => sidecar);
    apply_file_opt!(s, opts, verbose => verbose);
}
