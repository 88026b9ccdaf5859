//! Line format of collection exports
//!
//! A document is written as canonical extended JSON on a single line, so
//! dates, ObjectIds, binary data and numeric widths survive the round trip.

use crate::error::{Result, SnapshotError};
use bson::{Bson, Document};

/// Encode `doc` as one line of canonical extended JSON (no terminator)
pub fn encode_document(doc: Document) -> Result<String> {
    let value = Bson::Document(doc).into_canonical_extjson();
    serde_json::to_string(&value).map_err(|e| SnapshotError::Encode(e.to_string()))
}

/// Decode one line of extended JSON into a document
///
/// `line_number` is 1-based and only used for error reporting.
pub fn decode_line(line: &str, line_number: usize) -> Result<Document> {
    let parse_error = |message: String| SnapshotError::Parse {
        line: line_number,
        message,
    };

    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;

    match Bson::try_from(value).map_err(|e| parse_error(e.to_string()))? {
        Bson::Document(doc) => Ok(doc),
        other => Err(parse_error(format!(
            "expected a document, found {:?}",
            other.element_type()
        ))),
    }
}
