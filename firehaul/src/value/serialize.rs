//! Mode-aware value serialization.
//!
//! `readable` output never carries `__type` markers; `typed` output tags
//! every store-native kind so an importer can tell a serialized reference
//! from an ordinary string. The two encodings never mix within one tree.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::SecondsFormat;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use tracing::warn;

use crate::config::ExportMode;

use super::{FieldValue, Timestamp};

/// Marker key of the `typed` encoding.
pub const TYPE_KEY: &str = "__type";
/// Key under which `readable` mode wraps binary payloads.
pub const BYTES_KEY: &str = "__bytes_base64__";

/// Serialize one field value under `mode`. Recursive over arrays and
/// maps, terminal everywhere else.
///
/// Never fails: a timestamp with no calendar representation serializes as
/// its default string form, and doubles JSON cannot carry (NaN, ±inf)
/// become `null`.
pub fn serialize(value: &FieldValue, mode: ExportMode) -> JsonValue {
    match value {
        FieldValue::Null => JsonValue::Null,
        FieldValue::Boolean(b) => json!(b),
        FieldValue::Integer(n) => json!(n),
        FieldValue::Double(d) => serde_json::Number::from_f64(*d)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        FieldValue::String(s) => json!(s),
        FieldValue::Timestamp(ts) => timestamp_json(ts, mode),
        FieldValue::GeoPoint(point) => geo_point_json(point.latitude, point.longitude, mode),
        FieldValue::Reference(path) => reference_json(path, mode),
        FieldValue::Bytes(bytes) => bytes_json(bytes, mode),
        FieldValue::Array(items) => {
            JsonValue::Array(items.iter().map(|item| serialize(item, mode)).collect())
        }
        FieldValue::Map(fields) => {
            // Same shape order as `classify`: geo-point, then reference,
            // then plain map. A structurally matched map serializes
            // through its kind; whatever else it carried is dropped.
            if let Some(point) = value.as_geo_point() {
                geo_point_json(point.latitude, point.longitude, mode)
            } else if let Some(path) = value.reference_path() {
                reference_json(path, mode)
            } else {
                let mut object = JsonMap::with_capacity(fields.len());
                for (name, field) in fields {
                    object.insert(name.clone(), serialize(field, mode));
                }
                JsonValue::Object(object)
            }
        }
    }
}

fn timestamp_json(ts: &Timestamp, mode: ExportMode) -> JsonValue {
    let rendered = match ts.to_utc() {
        Some(datetime) => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => {
            warn!(%ts, "timestamp has no calendar form, writing its string form");
            ts.to_string()
        }
    };
    match mode {
        ExportMode::Readable => json!(rendered),
        ExportMode::Typed => tagged("timestamp", "value", json!(rendered)),
    }
}

fn geo_point_json(latitude: f64, longitude: f64, mode: ExportMode) -> JsonValue {
    match mode {
        ExportMode::Readable => {
            let mut object = JsonMap::with_capacity(2);
            object.insert("latitude".to_string(), json!(latitude));
            object.insert("longitude".to_string(), json!(longitude));
            JsonValue::Object(object)
        }
        ExportMode::Typed => {
            let mut object = JsonMap::with_capacity(3);
            object.insert(TYPE_KEY.to_string(), json!("geopoint"));
            object.insert("lat".to_string(), json!(latitude));
            object.insert("lng".to_string(), json!(longitude));
            JsonValue::Object(object)
        }
    }
}

fn reference_json(path: &str, mode: ExportMode) -> JsonValue {
    match mode {
        ExportMode::Readable => json!(path),
        ExportMode::Typed => tagged("ref", "path", json!(path)),
    }
}

fn bytes_json(bytes: &[u8], mode: ExportMode) -> JsonValue {
    let encoded = BASE64.encode(bytes);
    match mode {
        ExportMode::Readable => {
            let mut object = JsonMap::with_capacity(1);
            object.insert(BYTES_KEY.to_string(), json!(encoded));
            JsonValue::Object(object)
        }
        ExportMode::Typed => tagged("bytes_base64", "value", json!(encoded)),
    }
}

fn tagged(tag: &str, key: &str, value: JsonValue) -> JsonValue {
    let mut object = JsonMap::with_capacity(2);
    object.insert(TYPE_KEY.to_string(), json!(tag));
    object.insert(key.to_string(), value);
    JsonValue::Object(object)
}
