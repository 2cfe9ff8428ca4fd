//! Built-in processing steps for the CLI.

use log::debug;
use serde_json::{Value, json};
use std::path::Path;

use crate::engine::hashing::{hash_bytes, hash_file, to_hex};
use crate::pipeline::Processor;
use crate::{Meta, Payload};

/// Map a file extension to a MIME type for the formats the detector accepts.
pub fn content_type_for(identifier: &str) -> Option<&'static str> {
    let ext = Path::new(identifier)
        .extension()
        .and_then(|e| e.to_str())?
        .to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        "json" => Some("application/json"),
        _ => None,
    }
}

/// Blake3 digest of the payload. Bytes are hashed directly; an identifier (skip-read) names the
/// file to hash. `Null` stays `Null`. A file that cannot be hashed becomes `Null` with
/// `meta.extra["read_error"]`, like an unreadable file in the read stage.
pub fn checksum() -> Processor {
    Processor::with_meta(|mut meta: Meta, payload| {
        let hash = match payload {
            Payload::Bytes(ref b) => hash_bytes(b),
            Payload::Identifier(ref id) => match hash_file(Path::new(id)) {
                Ok(hash) => hash,
                Err(e) => {
                    debug!("checksum failed for {}: {:#}", id, e);
                    meta.set("read_error", format!("{:#}", e));
                    return Ok((meta, Payload::Null));
                }
            },
            other => return Ok((meta, other)),
        };
        Ok((meta, Payload::Json(json!({ "blake3": to_hex(&hash) }))))
    })
}

/// Classify the item by extension into `meta.extra["content_type"]`, or flag it with
/// `meta.extra["error"]` when the type is unknown. Payload unchanged.
pub fn content_type() -> Processor {
    Processor::with_meta(|mut meta: Meta, payload| {
        match content_type_for(&meta.identifier) {
            Some(ct) => meta.set("content_type", ct),
            None => meta.set(
                "error",
                "Unable to determine content_type from filename",
            ),
        }
        Ok((meta, payload))
    })
}

/// JSON form of any payload, for reports.
pub fn summarize_payload(payload: Payload) -> Value {
    match payload {
        Payload::Null => Value::Null,
        Payload::Bytes(b) => json!({ "bytes": b.len() }),
        Payload::Identifier(id) => json!({ "identifier": id }),
        Payload::Json(v) => v,
    }
}

/// Last CLI step: replace the payload with its JSON summary so large byte buffers are released
/// inside the worker instead of travelling to the writer.
pub fn summarize() -> Processor {
    Processor::payload_only(|payload| Ok(Payload::Json(summarize_payload(payload))))
}

/// The chain selected by CLI flags, in execution order.
pub fn build_chain(checksum_step: bool, content_type_step: bool) -> Vec<Processor> {
    let mut chain = Vec::new();
    if content_type_step {
        chain.push(content_type());
    }
    if checksum_step {
        chain.push(checksum());
    }
    chain.push(summarize());
    chain
}
