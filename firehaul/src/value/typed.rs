//! Decoder for the `typed` encoding.
//!
//! The paired reader for [`serialize`](super::serialize) under
//! `ExportMode::Typed`: every `__type` marker object maps back onto the
//! field value it came from, and plain JSON shapes decode structurally.
//! `readable` output has no decoder; that mode trades reconstruction
//! for legibility.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::{Error, Result};

use super::serialize::TYPE_KEY;
use super::{FieldValue, GeoPoint, Timestamp};

/// Decode a `typed`-mode JSON value back into a [`FieldValue`].
pub fn decode_typed(value: &JsonValue) -> Result<FieldValue> {
    match value {
        JsonValue::Null => Ok(FieldValue::Null),
        JsonValue::Bool(b) => Ok(FieldValue::Boolean(*b)),
        JsonValue::Number(number) => {
            if let Some(n) = number.as_i64() {
                Ok(FieldValue::Integer(n))
            } else {
                number
                    .as_f64()
                    .map(FieldValue::Double)
                    .ok_or_else(|| Error::Decode(format!("unrepresentable number {number}")))
            }
        }
        JsonValue::String(s) => Ok(FieldValue::String(s.clone())),
        JsonValue::Array(items) => items
            .iter()
            .map(decode_typed)
            .collect::<Result<Vec<_>>>()
            .map(FieldValue::Array),
        JsonValue::Object(object) => {
            if let Some(tag) = object.get(TYPE_KEY).and_then(JsonValue::as_str) {
                decode_tagged(tag, object)
            } else {
                let mut fields = Vec::with_capacity(object.len());
                for (name, field) in object {
                    fields.push((name.clone(), decode_typed(field)?));
                }
                Ok(FieldValue::Map(fields))
            }
        }
    }
}

fn decode_tagged(tag: &str, object: &JsonMap<String, JsonValue>) -> Result<FieldValue> {
    match tag {
        "timestamp" => {
            let raw = str_field(object, "value")?;
            parse_timestamp(raw)
                .map(FieldValue::Timestamp)
                .ok_or_else(|| Error::Decode(format!("unparseable timestamp '{raw}'")))
        }
        "geopoint" => Ok(FieldValue::GeoPoint(GeoPoint {
            latitude: num_field(object, "lat")?,
            longitude: num_field(object, "lng")?,
        })),
        "ref" => Ok(FieldValue::Reference(str_field(object, "path")?.to_string())),
        "bytes_base64" => BASE64
            .decode(str_field(object, "value")?)
            .map(FieldValue::Bytes)
            .map_err(|e| Error::Decode(format!("invalid base64 payload: {e}"))),
        other => Err(Error::Decode(format!("unknown type marker '{other}'"))),
    }
}

/// Accepts the RFC 3339 calendar form and, for instants that had no
/// calendar representation, the fallback form
/// `Timestamp(seconds=…, nanos=…)`.
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(Timestamp::from_datetime(parsed.with_timezone(&Utc)));
    }
    let inner = raw
        .strip_prefix("Timestamp(seconds=")?
        .strip_suffix(')')?;
    let (seconds, nanos) = inner.split_once(", nanos=")?;
    Some(Timestamp::new(
        seconds.trim().parse().ok()?,
        nanos.trim().parse().ok()?,
    ))
}

fn str_field<'a>(object: &'a JsonMap<String, JsonValue>, key: &str) -> Result<&'a str> {
    object
        .get(key)
        .and_then(JsonValue::as_str)
        .ok_or_else(|| Error::Decode(format!("marker object missing string '{key}'")))
}

fn num_field(object: &JsonMap<String, JsonValue>, key: &str) -> Result<f64> {
    object
        .get(key)
        .and_then(JsonValue::as_f64)
        .ok_or_else(|| Error::Decode(format!("marker object missing number '{key}'")))
}
