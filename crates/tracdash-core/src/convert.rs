// ── API-to-domain type conversions ──
//
// Bridges raw `tracdash_api::models` wire types into `tracdash_core::model`
// domain types. Timestamps are parsed into `DateTime<Utc>`; ids are
// wrapped in their newtypes; unparseable optional values are dropped.

use chrono::{DateTime, Utc};

use tracdash_api::models::{ApiDevice, ApiPosition, ApiServer, ApiUser};

use crate::model::{
    Device, DeviceId, DeviceStatus, GeofenceId, Position, PositionId, Server, User,
};

/// Parse an ISO-8601 timestamp as sent by the server.
fn parse_datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<ApiDevice> for Device {
    fn from(d: ApiDevice) -> Self {
        Self {
            id: DeviceId(d.id),
            name: d.name,
            unique_id: d.unique_id,
            status: d
                .status
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            disabled: d.disabled,
            last_update: parse_datetime(d.last_update.as_deref()),
            position_id: d.position_id.filter(|id| *id > 0).map(PositionId),
            phone: d.phone,
            model: d.model,
            category: d.category,
            attributes: d.attributes,
        }
    }
}

impl From<ApiPosition> for Position {
    fn from(p: ApiPosition) -> Self {
        Self {
            id: PositionId(p.id),
            device_id: DeviceId(p.device_id),
            protocol: p.protocol,
            server_time: parse_datetime(p.server_time.as_deref()),
            device_time: parse_datetime(p.device_time.as_deref()),
            fix_time: parse_datetime(p.fix_time.as_deref()),
            outdated: p.outdated,
            valid: p.valid,
            latitude: p.latitude,
            longitude: p.longitude,
            altitude: p.altitude,
            speed: p.speed,
            course: p.course,
            address: p.address.filter(|a| !a.is_empty()),
            accuracy: p.accuracy,
            geofence_ids: p
                .geofence_ids
                .map(|ids| ids.into_iter().map(GeofenceId).collect()),
            attributes: p.attributes,
        }
    }
}

impl From<ApiUser> for User {
    fn from(u: ApiUser) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            administrator: u.administrator,
            readonly: u.readonly,
            device_readonly: u.device_readonly,
            limit_commands: u.limit_commands,
            temporary: u.temporary,
            attributes: u.attributes,
        }
    }
}

impl From<ApiServer> for Server {
    fn from(s: ApiServer) -> Self {
        Self {
            readonly: s.readonly,
            device_readonly: s.device_readonly,
            version: s.version,
            attributes: s.attributes,
        }
    }
}
