//! Field values and their classification.
//!
//! Every value reachable from a document's field set classifies into
//! exactly one [`Kind`]. Classification is structural: composite values
//! can match several shapes, so the detection order in [`classify`] is a
//! contract, not an implementation detail: reordering it changes
//! observable output for ambiguous values.

pub mod serialize;
pub mod typed;

pub use serialize::{serialize, BYTES_KEY, TYPE_KEY};
pub use typed::decode_typed;

use chrono::{DateTime, Utc};
use std::fmt;

/// An ordered set of named fields. Order is fetch order and survives all
/// the way into the output files.
pub type FieldMap = Vec<(String, FieldValue)>;

/// A single document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(Timestamp),
    GeoPoint(GeoPoint),
    /// Slash-delimited path of another document (`users/u1`).
    Reference(String),
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
    /// Composite value; insertion order preserved.
    Map(FieldMap),
}

impl FieldValue {
    /// Look up a field of a `Map` value by name. `None` for every other
    /// variant.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        match self {
            FieldValue::Map(fields) => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Geo-point view of this value: the variant itself, or any map
    /// exposing numeric `latitude` and `longitude` fields. Extra fields
    /// do not disqualify a map; structural match is sufficient.
    pub fn as_geo_point(&self) -> Option<GeoPoint> {
        match self {
            FieldValue::GeoPoint(point) => Some(*point),
            FieldValue::Map(_) => {
                let latitude = self.field("latitude")?.as_f64()?;
                let longitude = self.field("longitude")?.as_f64()?;
                Some(GeoPoint {
                    latitude,
                    longitude,
                })
            }
            _ => None,
        }
    }

    /// Reference view of this value: the variant itself, or any map
    /// exposing a string `path` field. Checked after the geo-point shape;
    /// see [`classify`].
    pub fn reference_path(&self) -> Option<&str> {
        match self {
            FieldValue::Reference(path) => Some(path),
            FieldValue::Map(_) => match self.field("path")? {
                FieldValue::String(path) => Some(path),
                _ => None,
            },
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(value) => Some(*value as f64),
            FieldValue::Double(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Double(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<Timestamp> for FieldValue {
    fn from(value: Timestamp) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(value: GeoPoint) -> Self {
        FieldValue::GeoPoint(value)
    }
}

/// Store-native instant: seconds and nanoseconds since the Unix epoch.
///
/// Exposes both conversion capabilities the classifier keys on: calendar
/// time (fallible, the calendar cannot represent every `i64` second
/// count) and epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl Timestamp {
    pub fn new(seconds: i64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self {
            seconds: datetime.timestamp(),
            nanos: datetime.timestamp_subsec_nanos(),
        }
    }

    /// Calendar form. `None` for instants outside the representable
    /// range; serialization then falls back to the [`Display`] form.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }

    /// Milliseconds since the Unix epoch, saturating at the `i64` range.
    pub fn epoch_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanos / 1_000_000))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp(seconds={}, nanos={})", self.seconds, self.nanos)
    }
}

/// Latitude and longitude in floating-point degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Semantic kind of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Scalar,
    Timestamp,
    GeoPoint,
    Reference,
    Bytes,
    Array,
    Map,
}

/// Classify a value into its semantic kind. Pure and total.
///
/// Detection order, first match wins:
/// 1. null
/// 2. timestamp
/// 3. geo-point, including any map with numeric `latitude` and
///    `longitude` fields, whatever else it carries
/// 4. reference, including any remaining map with a string `path` field
/// 5. bytes
/// 6. array
/// 7. map
/// 8. scalar (string, number, boolean)
pub fn classify(value: &FieldValue) -> Kind {
    match value {
        FieldValue::Null => Kind::Null,
        FieldValue::Timestamp(_) => Kind::Timestamp,
        FieldValue::GeoPoint(_) => Kind::GeoPoint,
        FieldValue::Reference(_) => Kind::Reference,
        FieldValue::Bytes(_) => Kind::Bytes,
        FieldValue::Array(_) => Kind::Array,
        FieldValue::Map(_) => {
            // Geo-point shape takes precedence over reference shape: a map
            // carrying latitude/longitude and a path is a geo-point.
            if value.as_geo_point().is_some() {
                Kind::GeoPoint
            } else if value.reference_path().is_some() {
                Kind::Reference
            } else {
                Kind::Map
            }
        }
        FieldValue::Boolean(_)
        | FieldValue::Integer(_)
        | FieldValue::Double(_)
        | FieldValue::String(_) => Kind::Scalar,
    }
}
