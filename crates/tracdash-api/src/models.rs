// Wire types for the tracking server's JSON API
//
// Field names follow the server's camelCase JSON. Fields use
// `#[serde(default)]` liberally because older server versions omit
// optional members instead of sending null.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form attribute bag attached to most entities.
pub type Attributes = Map<String, Value>;

// ── Device ───────────────────────────────────────────────────────────

/// Device object from `GET /api/devices`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDevice {
    pub id: i64,
    pub name: String,
    pub unique_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub position_id: Option<i64>,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

// ── Position ─────────────────────────────────────────────────────────

/// Position object from `GET /api/positions`.
///
/// Speed is in knots, altitude and accuracy in meters, course in degrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    pub id: i64,
    pub device_id: i64,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub server_time: Option<String>,
    #[serde(default)]
    pub device_time: Option<String>,
    #[serde(default)]
    pub fix_time: Option<String>,
    #[serde(default)]
    pub outdated: bool,
    #[serde(default)]
    pub valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: f64,
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub course: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub geofence_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub attributes: Attributes,
}

// ── Session / server ─────────────────────────────────────────────────

/// Authenticated user from `GET /api/session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ApiUser {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub administrator: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub device_readonly: bool,
    #[serde(default)]
    pub limit_commands: bool,
    /// Set for sessions opened through a share link.
    #[serde(default)]
    pub temporary: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Server-wide settings from `GET /api/server`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiServer {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub registration: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub device_readonly: bool,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
}

// ── Geofence / permission ────────────────────────────────────────────

/// Geofence as returned by `POST /api/geofences`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGeofence {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub area: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Body for `POST /api/geofences`. The server assigns the id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGeofence {
    pub name: String,
    pub area: String,
}

/// Body for `POST /api/permissions` linking a device to a geofence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeviceGeofenceLink {
    pub device_id: i64,
    pub geofence_id: i64,
}

// ── Command ──────────────────────────────────────────────────────────

/// Body for `POST /api/commands/send`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    pub id: i64,
    pub attributes: Attributes,
    pub device_id: i64,
    #[serde(rename = "type")]
    pub command_type: String,
    pub text_channel: bool,
    pub description: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn command_request_uses_wire_names() {
        let req = CommandRequest {
            id: 9,
            attributes: Attributes::new(),
            device_id: 42,
            command_type: "lightOn".into(),
            text_channel: false,
            description: "Licht An".into(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "id": 9,
                "attributes": {},
                "deviceId": 42,
                "type": "lightOn",
                "textChannel": false,
                "description": "Licht An"
            })
        );
    }

    #[test]
    fn position_tolerates_missing_optional_fields() {
        let pos: ApiPosition = serde_json::from_value(json!({
            "id": 1,
            "deviceId": 2,
            "latitude": 52.5,
            "longitude": 13.4
        }))
        .unwrap();
        assert!(pos.geofence_ids.is_none());
        assert!(pos.attributes.is_empty());
        assert!(!pos.valid);
    }
}
