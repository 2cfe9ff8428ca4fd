//! Input listing: walk directories, filter, natural-sort, read manifests.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::cmp::Ordering;
use std::path::Path;
use walkdir::WalkDir;

/// Check if a file should be excluded based on OS-specific hidden files
pub fn is_os_hidden_file(path: &Path) -> bool {
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name {
            // macOS
            ".DS_Store" | ".AppleDouble" | ".LSOverride" => true,
            // Windows
            "Thumbs.db" | "ehthumbs.db" | "Desktop.ini" | "$RECYCLE.BIN" => true,
            // Linux
            ".directory" => true,
            _ => {
                // macOS resource forks and Linux trash dirs
                name.starts_with("._") || name.starts_with(".Trash-")
            }
        }
    } else {
        false
    }
}

/// Returns true if the walk should keep `path` (not the root itself, not hidden, not excluded).
pub fn should_include_in_walk(path: &Path, root: &Path, exclude_patterns: &[String]) -> bool {
    if path == root {
        return true;
    }
    if is_os_hidden_file(path) {
        return false;
    }
    if exclude_patterns.is_empty() {
        return true;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return true,
    };
    let path_str = path.to_str().unwrap_or("");
    !exclude_patterns
        .iter()
        .any(|pattern| glob_match(pattern, name) || glob_match(pattern, path_str))
}

/// Simple glob pattern matching (supports * and ?)
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    glob_match_chars(&p, &t)
}

fn glob_match_chars(p: &[char], t: &[char]) -> bool {
    match p.split_first() {
        None => t.is_empty(),
        Some(('*', rest)) => {
            if rest.is_empty() {
                return true; // trailing * matches everything
            }
            (0..=t.len()).any(|skip| glob_match_chars(rest, &t[skip..]))
        }
        Some(('?', rest)) => !t.is_empty() && glob_match_chars(rest, &t[1..]),
        Some((c, rest)) => t.first() == Some(c) && glob_match_chars(rest, &t[1..]),
    }
}

/// True if `path` has one of `extensions` (case-insensitive, leading dot optional). Empty list keeps everything.
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

/// Split into alternating digit / non-digit runs: "z23a" -> [Text("z"), Digits("23"), Text("a")].
fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits = None;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(d) if d != is_digit => {
                out.push(chunk(&s[start..i], d));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(d) = digits {
        out.push(chunk(&s[start..], d));
    }
    out
}

fn chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits { Chunk::Digits(s) } else { Chunk::Text(s) }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Natural order: digit runs compare by value, so "img2" < "img10".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len())
}

pub fn natural_sort(items: &mut [String]) {
    items.sort_by(|a, b| natural_cmp(a, b));
}

/// Build the ordered identifier list from files and directories. Files are kept as given;
/// each directory is walked recursively and its files natural-sorted. Unreadable entries are
/// skipped with a warning.
pub fn list_inputs(
    inputs: &[impl AsRef<Path>],
    extensions: &[String],
    exclude: &[String],
    follow_links: bool,
) -> Result<Vec<String>> {
    let mut out = Vec::new();
    let mut skipped = 0_usize;
    for input in inputs {
        let input = input.as_ref();
        let meta = std::fs::metadata(input)
            .with_context(|| format!("read input {}", input.display()))?;
        if !meta.is_dir() {
            out.push(input.to_string_lossy().into_owned());
            continue;
        }
        let mut found = Vec::new();
        let walker = WalkDir::new(input)
            .follow_links(follow_links)
            .into_iter()
            .filter_entry(|e| should_include_in_walk(e.path(), input, exclude));
        for entry in walker {
            match entry {
                Ok(e) if e.file_type().is_file() && has_extension(e.path(), extensions) => {
                    found.push(e.path().to_string_lossy().into_owned());
                }
                Ok(_) => {}
                Err(err) => {
                    skipped += 1;
                    debug!("skipped during walk: {}", err);
                }
            }
        }
        natural_sort(&mut found);
        debug!("{}: {} files", input.display(), found.len());
        out.extend(found);
    }
    if skipped > 0 {
        warn!(
            "Skipped {} paths due to permission errors or access issues",
            skipped
        );
    }
    Ok(out)
}

/// Parse a manifest: one identifier per line, order kept. Blank lines and `#` comments are skipped.
pub fn parse_manifest(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read manifest {}", path.display()))?;
    Ok(parse_manifest(&text))
}
