use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user owning the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub administrator: bool,
    pub readonly: bool,
    pub device_readonly: bool,
    pub limit_commands: bool,
    /// Session opened from a share link.
    pub temporary: bool,
    pub attributes: Map<String, Value>,
}

/// Server-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Server {
    pub readonly: bool,
    pub device_readonly: bool,
    pub version: Option<String>,
    pub attributes: Map<String, Value>,
}

impl Server {
    /// `disableShare` server attribute.
    pub fn share_disabled(&self) -> bool {
        self.attributes
            .get("disableShare")
            .is_some_and(|v| v.as_bool().unwrap_or(false))
    }
}
