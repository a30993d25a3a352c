//! # Critical-Resource Payload Format
//!
//! Binary encoding of a [`CriticalResourceRecord`] as stored in the
//! property cache.
//!
//! Format: a run of postcard frames, one per resource, each
//! `(context, resource)`. Frames are written html first, then css, each in
//! sorted order, so equal records encode to identical bytes.
//!
//! An empty record therefore encodes to zero bytes. Stores refuse empty
//! payloads, so the store-facing functions substitute
//! [`EMPTY_VALUE_PLACEHOLDER`] on write and recognise it on read.
//!
//! ## Limits
//!
//! Payloads over [`MAX_CRITICAL_PAYLOAD_SIZE`] are rejected before any
//! decoding and after encoding.

use crate::critical::CriticalResourceRecord;
use crate::primitives::{EMPTY_VALUE_PLACEHOLDER, MAX_CRITICAL_PAYLOAD_SIZE};
use crate::{CriticalContext, SluiceError};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EntryRef<'a> {
    context: CriticalContext,
    resource: &'a str,
}

#[derive(Deserialize)]
struct Entry {
    context: CriticalContext,
    resource: String,
}

// =============================================================================
// RAW ENCODING
// =============================================================================

/// Encode a record. An empty record yields an empty vector.
pub fn record_to_bytes(record: &CriticalResourceRecord) -> Result<Vec<u8>, SluiceError> {
    let mut bytes = Vec::new();
    for context in CriticalContext::ALL {
        for resource in record.get(context) {
            let frame = postcard::to_stdvec(&EntryRef {
                context,
                resource: resource.as_str(),
            })
            .map_err(|e| SluiceError::SerializationError(e.to_string()))?;
            bytes.extend_from_slice(&frame);
            if bytes.len() > MAX_CRITICAL_PAYLOAD_SIZE {
                return Err(SluiceError::SerializationError(format!(
                    "Critical resource payload exceeds maximum allowed {} bytes",
                    MAX_CRITICAL_PAYLOAD_SIZE
                )));
            }
        }
    }
    Ok(bytes)
}

/// Decode a record produced by [`record_to_bytes`].
pub fn record_from_bytes(bytes: &[u8]) -> Result<CriticalResourceRecord, SluiceError> {
    if bytes.len() > MAX_CRITICAL_PAYLOAD_SIZE {
        return Err(SluiceError::DeserializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_CRITICAL_PAYLOAD_SIZE
        )));
    }

    let mut record = CriticalResourceRecord::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        let (entry, tail): (Entry, &[u8]) = postcard::take_from_bytes(rest).map_err(|e| {
            SluiceError::DeserializationError(format!("Failed to decode critical resource: {}", e))
        })?;
        match entry.context {
            CriticalContext::Html => record.html.insert(entry.resource),
            CriticalContext::Css => record.css.insert(entry.resource),
        };
        rest = tail;
    }
    Ok(record)
}

// =============================================================================
// STORE PAYLOADS
// =============================================================================

/// Bytes to hand to the property store; never empty.
pub fn record_to_payload(record: &CriticalResourceRecord) -> Result<Vec<u8>, SluiceError> {
    let bytes = record_to_bytes(record)?;
    if bytes.is_empty() {
        return Ok(EMPTY_VALUE_PLACEHOLDER.to_vec());
    }
    Ok(bytes)
}

/// Decode bytes read from the property store, honouring the placeholder.
pub fn record_from_payload(payload: &[u8]) -> Result<CriticalResourceRecord, SluiceError> {
    if payload == EMPTY_VALUE_PLACEHOLDER {
        return Ok(CriticalResourceRecord::new());
    }
    record_from_bytes(payload)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn empty_record_encodes_to_nothing() {
        let bytes = record_to_bytes(&CriticalResourceRecord::new()).expect("encode");
        assert!(bytes.is_empty());
    }

    #[test]
    fn empty_record_payload_is_placeholder() {
        let payload = record_to_payload(&CriticalResourceRecord::new()).expect("encode");
        assert_eq!(payload, EMPTY_VALUE_PLACEHOLDER);
        assert!(record_from_payload(&payload).expect("decode").is_empty());
    }

    #[test]
    fn contexts_survive_encoding() {
        let record = CriticalResourceRecord {
            html: set(&["http://a.com/hero.jpg", "http://a.com/logo.png"]),
            css: set(&["http://a.com/bg.png"]),
        };
        let payload = record_to_payload(&record).expect("encode");
        assert_eq!(record_from_payload(&payload).expect("decode"), record);
    }

    #[test]
    fn encoding_is_bit_exact() {
        let record = CriticalResourceRecord {
            html: set(&["b", "a"]),
            css: set(&["c"]),
        };
        let first = record_to_bytes(&record).expect("encode");
        let second = record_to_bytes(&record_from_bytes(&first).expect("decode")).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(record_from_payload(&[0xff, 0xff, 0xff]).is_err());
        assert!(record_from_payload(b"\x05").is_err());
    }

    #[test]
    fn oversized_payload_is_rejected_before_decoding() {
        let bytes = vec![0u8; MAX_CRITICAL_PAYLOAD_SIZE + 1];
        assert!(matches!(
            record_from_bytes(&bytes),
            Err(SluiceError::DeserializationError(_))
        ));
    }

    #[test]
    fn oversized_record_fails_to_encode() {
        let huge = "x".repeat(MAX_CRITICAL_PAYLOAD_SIZE);
        let record = CriticalResourceRecord {
            html: set(&[huge.as_str()]),
            css: BTreeSet::new(),
        };
        assert!(matches!(
            record_to_payload(&record),
            Err(SluiceError::SerializationError(_))
        ));
    }
}
