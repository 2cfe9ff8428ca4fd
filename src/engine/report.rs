//! Ordered report output: one JSON line per item, optional per-item sidecar files.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::processors::summarize_payload;
use crate::utils::config::PackagePaths;
use crate::{Item, Meta};

/// One report line.
#[derive(Debug, Serialize)]
pub struct ReportRecord<'a> {
    pub index: u64,
    pub identifier: &'a str,
    pub total: u64,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: &'a Map<String, Value>,
    pub payload: Value,
}

impl<'a> ReportRecord<'a> {
    pub fn new(meta: &'a Meta, payload: Value) -> Self {
        ReportRecord {
            index: meta.index,
            identifier: &meta.identifier,
            total: meta.total,
            extra: &meta.extra,
            payload,
        }
    }
}

/// Counts for the end-of-run summary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub written: usize,
    /// Items whose payload ended up null (usually unreadable files).
    pub null_payloads: usize,
    /// Items a stage flagged with an `error` value.
    pub flagged: usize,
}

/// Writes ordered items as JSON lines.
pub struct ReportWriter {
    out: Box<dyn Write>,
    sidecar: bool,
    stats: ReportStats,
}

impl ReportWriter {
    /// Report to `path`, or stdout when None.
    pub fn create(path: Option<&Path>, sidecar: bool) -> Result<Self> {
        let out: Box<dyn Write> = match path {
            Some(p) => Box::new(BufWriter::new(
                File::create(p).with_context(|| format!("create report {}", p.display()))?,
            )),
            None => Box::new(BufWriter::new(std::io::stdout())),
        };
        Ok(Self::from_writer(out, sidecar))
    }

    pub fn from_writer(out: Box<dyn Write>, sidecar: bool) -> Self {
        ReportWriter {
            out,
            sidecar,
            stats: ReportStats::default(),
        }
    }

    pub fn write_item(&mut self, item: Item) -> Result<()> {
        let (meta, payload) = item;
        let payload = summarize_payload(payload);
        if payload.is_null() {
            self.stats.null_payloads += 1;
        }
        if meta.has_error() {
            self.stats.flagged += 1;
        }
        let record = ReportRecord::new(&meta, payload);
        serde_json::to_writer(&mut self.out, &record).context("write report line")?;
        self.out.write_all(b"\n")?;
        if self.sidecar {
            write_sidecar(&record)?;
        }
        self.stats.written += 1;
        Ok(())
    }

    /// Flush and return the final counts.
    pub fn finish(mut self) -> Result<ReportStats> {
        self.out.flush().context("flush report")?;
        Ok(self.stats)
    }
}

/// Path of the sidecar for `identifier`: the identifier with `.json` appended.
pub fn sidecar_path(identifier: &str) -> PathBuf {
    PathBuf::from(format!(
        "{}.{}",
        identifier,
        PackagePaths::get().sidecar_extension()
    ))
}

fn write_sidecar(record: &ReportRecord<'_>) -> Result<()> {
    let path = sidecar_path(record.identifier);
    let file =
        File::create(&path).with_context(|| format!("create sidecar {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &record.payload)
        .with_context(|| format!("write sidecar {}", path.display()))?;
    Ok(())
}
