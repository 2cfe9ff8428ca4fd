//! blake3 digests for the checksum step.

use anyhow::{Context, Result};
use blake3::{Hash, Hasher};
use memmap2::Mmap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::utils::config::HashingConsts;

/// Digest of a file on disk (skip-read mode, where the payload is only a path).
/// Large files are memory-mapped; smaller ones stream through a buffered reader.
pub fn hash_file(path: &Path) -> Result<[u8; 32]> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let size = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();

    let mut hasher = Hasher::new();
    if size > HashingConsts::HASH_MMAP_THRESHOLD {
        // SAFETY: read-only map; a concurrent truncation can only corrupt this digest.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("mmap {}", path.display()))?;
        hasher.update(&mmap);
    } else {
        let reader = BufReader::with_capacity(HashingConsts::HASH_READ_CHUNK_SIZE, file);
        hasher
            .update_reader(reader)
            .with_context(|| format!("read {}", path.display()))?;
    }
    Ok(*hasher.finalize().as_bytes())
}

/// Digest of a payload already in memory.
pub fn hash_bytes(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

pub fn to_hex(hash: &[u8; 32]) -> String {
    Hash::from_bytes(*hash).to_hex().to_string()
}
