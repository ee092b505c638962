//! Remote-to-local schema translation.
//!
//! The archive's metadata keys map onto catalog fields through a fixed,
//! closed table. Translation is strict: any key outside the table fails
//! the record with a schema mismatch, so an upstream schema change shows
//! up loudly instead of silently dropping data.

use std::str::FromStr;

use serde_json::Value;
use tracing::warn;

use crate::catalog::{Record, StreamKind};

use super::error::SyncError;

/// One line of the external index document.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub kind: StreamKind,
    pub id_path: String,
}

/// Translate an archive metadata object into a catalog record.
///
/// Key mapping: `streamer→user`, `date→date`, `streamType→kind`,
/// `streamTitle→title`, `id→id_path`. `downloaded` always starts false;
/// only a completed transcript write flips it. A payload missing `id` or
/// `streamType` is rejected too, since the record would be unusable
/// without its key or category.
pub fn translate_metadata(payload: &Value) -> Result<Record, SyncError> {
    let object = payload
        .as_object()
        .ok_or_else(|| mismatch("stream metadata is not a JSON object"))?;

    let mut date = None;
    let mut user = None;
    let mut kind = None;
    let mut title = None;
    let mut id_path = None;

    for (key, value) in object {
        match key.as_str() {
            "streamer" => user = Some(string_field(key, value)?),
            "date" => date = Some(string_field(key, value)?),
            "streamTitle" => title = Some(string_field(key, value)?),
            "id" => id_path = Some(string_field(key, value)?),
            "streamType" => {
                let token = string_field(key, value)?;
                kind = Some(
                    StreamKind::from_str(remap_type_token(&token)).map_err(|_| {
                        mismatch(&format!("unknown streamType '{}'", token))
                    })?,
                );
            }
            other => {
                return Err(mismatch(&format!(
                    "unexpected key '{}' in stream metadata",
                    other
                )))
            }
        }
    }

    Ok(Record {
        date,
        user,
        kind: kind.ok_or_else(|| mismatch("stream metadata missing 'streamType'"))?,
        title,
        downloaded: false,
        id_path: id_path.ok_or_else(|| mismatch("stream metadata missing 'id'"))?,
    })
}

/// Map a remote type token to the local vocabulary.
///
/// `twitchvod → twitch` is the single non-identity rule; unknown tokens
/// pass through unchanged.
pub fn remap_type_token(token: &str) -> &str {
    match token {
        "twitchvod" => "twitch",
        other => other,
    }
}

/// Parse the external index document into `(kind, id_path)` entries.
///
/// One `<type-token> <id_path>` pair per line; blank lines are tolerated
/// anywhere. Lines that are not two fields, or whose remapped token does
/// not name a known category, are skipped with a warning.
pub fn parse_index(text: &str) -> Vec<IndexEntry> {
    let mut entries = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let (token, id_path) = match (fields.next(), fields.next(), fields.next()) {
            (Some(token), Some(id_path), None) => (token, id_path),
            _ => {
                warn!(line, "Skipping malformed index line");
                continue;
            }
        };

        match StreamKind::from_str(remap_type_token(token)) {
            Ok(kind) => entries.push(IndexEntry {
                kind,
                id_path: id_path.to_string(),
            }),
            Err(_) => warn!(token, id_path, "Skipping index entry with unknown stream type"),
        }
    }

    entries
}

fn string_field(key: &str, value: &Value) -> Result<String, SyncError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| mismatch(&format!("key '{}' in stream metadata is not a string", key)))
}

fn mismatch(detail: &str) -> SyncError {
    SyncError::SchemaMismatch {
        detail: detail.to_string(),
    }
}
