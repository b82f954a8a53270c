//! Decoding of `KEY:VALUE[,KEY:VALUE...]` device lines.

use crate::error::FieldParseError;
use crate::telemetry::data::{FieldKey, ParsedUpdate};
use tracing::debug;

const FIELD_SEPARATOR: char = ',';
const KEY_VALUE_SEPARATOR: char = ':';

/// Parse a raw device line into a partial update.
///
/// Malformed fields are dropped individually; the rest of the line still
/// applies. Segments without a `:` and unknown keys are ignored. A line with
/// nothing recognizable yields an empty update.
pub fn parse_line(line: &str) -> ParsedUpdate {
    let mut update = ParsedUpdate::default();

    for segment in line.trim().split(FIELD_SEPARATOR) {
        if let Err(e) = parse_segment(segment, &mut update) {
            debug!("Dropping field: {}", e);
        }
    }

    update
}

/// Decode one segment into `update`.
fn parse_segment(segment: &str, update: &mut ParsedUpdate) -> Result<(), FieldParseError> {
    let Some((key, value)) = segment.split_once(KEY_VALUE_SEPARATOR) else {
        return Ok(());
    };

    if value.contains(KEY_VALUE_SEPARATOR) {
        return Err(FieldParseError::AmbiguousDelimiter {
            segment: segment.to_string(),
        });
    }

    let Ok(key) = key.trim().parse::<FieldKey>() else {
        return Ok(());
    };
    let value = value.trim();

    match key {
        FieldKey::Count => update.count = Some(parse_integer(key, value)?),
        FieldKey::UsageSeconds => update.usage_seconds = Some(parse_integer(key, value)?),
        FieldKey::Light => update.light = Some(value.to_string()),
    }

    Ok(())
}

fn parse_integer(key: FieldKey, value: &str) -> Result<u64, FieldParseError> {
    value
        .parse::<u64>()
        .map_err(|_| FieldParseError::InvalidInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
}
