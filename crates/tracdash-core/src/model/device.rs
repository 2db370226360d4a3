use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use super::ids::{DeviceId, PositionId};

/// Connection state reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceStatus {
    Online,
    Offline,
    #[default]
    Unknown,
}

/// A tracked device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub unique_id: String,
    pub status: DeviceStatus,
    pub disabled: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub position_id: Option<PositionId>,
    pub phone: Option<String>,
    pub model: Option<String>,
    pub category: Option<String>,
    pub attributes: Map<String, Value>,
}

impl Device {
    /// Image file name stored under the `deviceImage` attribute.
    pub fn image(&self) -> Option<&str> {
        self.attributes
            .get("deviceImage")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}
