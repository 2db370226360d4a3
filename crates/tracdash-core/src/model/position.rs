// ── Position samples ──
//
// A position has a fixed set of typed fields plus an open attribute bag.
// Display code addresses both through one key namespace: `lookup` tries
// the fixed fields first, then the bag.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::{DeviceId, GeofenceId, PositionId};

/// Keys that name fixed position fields rather than attributes.
pub const FIXED_FIELDS: &[&str] = &[
    "id",
    "deviceId",
    "protocol",
    "serverTime",
    "deviceTime",
    "fixTime",
    "outdated",
    "valid",
    "latitude",
    "longitude",
    "altitude",
    "speed",
    "course",
    "address",
    "accuracy",
    "geofenceIds",
];

/// A point-in-time sample. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub device_id: DeviceId,
    pub protocol: Option<String>,
    pub server_time: Option<DateTime<Utc>>,
    pub device_time: Option<DateTime<Utc>>,
    pub fix_time: Option<DateTime<Utc>>,
    pub outdated: bool,
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Meters.
    pub altitude: f64,
    /// Knots.
    pub speed: f64,
    /// Degrees.
    pub course: f64,
    pub address: Option<String>,
    /// Meters.
    pub accuracy: f64,
    pub geofence_ids: Option<Vec<GeofenceId>>,
    pub attributes: Map<String, Value>,
}

/// Where a looked-up key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Fixed,
    Attribute,
}

/// A position value, typed as far as the source allows.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
    Time(DateTime<Utc>),
    Ids(Vec<i64>),
    Json(Value),
    /// Present but unset (e.g. no resolved address yet).
    Empty,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
            Self::Integer(n) => Some(*n as f64),
            Self::Json(v) => v.as_f64(),
            _ => None,
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Number))
                .unwrap_or_else(|| Self::Json(value.clone())),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Json(value.clone()),
        }
    }
}

impl Position {
    /// Resolve `key` against the fixed fields, then the attribute bag.
    ///
    /// Returns `None` only when the key exists in neither.
    pub fn lookup(&self, key: &str) -> Option<(FieldSource, FieldValue)> {
        if let Some(value) = self.fixed(key) {
            return Some((FieldSource::Fixed, value));
        }
        self.attributes
            .get(key)
            .map(|v| (FieldSource::Attribute, FieldValue::from_json(v)))
    }

    /// Whether `key` resolves through [`lookup`](Self::lookup).
    pub fn has_field(&self, key: &str) -> bool {
        FIXED_FIELDS.contains(&key) || self.attributes.contains_key(key)
    }

    fn fixed(&self, key: &str) -> Option<FieldValue> {
        let time = |t: Option<DateTime<Utc>>| t.map_or(FieldValue::Empty, FieldValue::Time);
        Some(match key {
            "id" => FieldValue::Integer(self.id.0),
            "deviceId" => FieldValue::Integer(self.device_id.0),
            "protocol" => self
                .protocol
                .clone()
                .map_or(FieldValue::Empty, FieldValue::Text),
            "serverTime" => time(self.server_time),
            "deviceTime" => time(self.device_time),
            "fixTime" => time(self.fix_time),
            "outdated" => FieldValue::Bool(self.outdated),
            "valid" => FieldValue::Bool(self.valid),
            "latitude" => FieldValue::Number(self.latitude),
            "longitude" => FieldValue::Number(self.longitude),
            "altitude" => FieldValue::Number(self.altitude),
            "speed" => FieldValue::Number(self.speed),
            "course" => FieldValue::Number(self.course),
            "accuracy" => FieldValue::Number(self.accuracy),
            "address" => self
                .address
                .clone()
                .map_or(FieldValue::Empty, FieldValue::Text),
            "geofenceIds" => self.geofence_ids.as_ref().map_or(FieldValue::Empty, |ids| {
                FieldValue::Ids(ids.iter().map(|g| g.0).collect())
            }),
            _ => return None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample() -> Position {
        let attributes = json!({ "batteryLevel": 80, "totalDistance": 12_345.6, "sat": 9 });
        Position {
            id: PositionId(900),
            device_id: DeviceId(42),
            protocol: Some("osmand".into()),
            server_time: None,
            device_time: None,
            fix_time: Some("2024-01-01T08:30:00Z".parse().unwrap()),
            outdated: false,
            valid: true,
            latitude: 52.52,
            longitude: 13.405,
            altitude: 34.0,
            speed: 10.0,
            course: 90.0,
            address: None,
            accuracy: 5.0,
            geofence_ids: None,
            attributes: attributes.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn fixed_field_wins_over_attribute() {
        let mut pos = sample();
        pos.attributes.insert("speed".into(), json!(99));
        assert_eq!(
            pos.lookup("speed"),
            Some((FieldSource::Fixed, FieldValue::Number(10.0)))
        );
    }

    #[test]
    fn attribute_used_when_no_fixed_field() {
        let pos = sample();
        assert_eq!(
            pos.lookup("batteryLevel"),
            Some((FieldSource::Attribute, FieldValue::Integer(80)))
        );
    }

    #[test]
    fn unknown_key_is_absent() {
        let pos = sample();
        assert!(pos.lookup("fuel").is_none());
        assert!(!pos.has_field("fuel"));
    }

    #[test]
    fn unset_fixed_field_is_present_but_empty() {
        let pos = sample();
        assert_eq!(pos.lookup("address"), Some((FieldSource::Fixed, FieldValue::Empty)));
    }
}
