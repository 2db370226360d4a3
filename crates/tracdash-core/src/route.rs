// ── Navigation targets ──
//
// Toolbar entries that open another page resolve to a `Route`. The
// terminal front-ends show or open them; `path()` yields the web
// dashboard path for the same page.

use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

use crate::model::{DeviceId, GeofenceId, PositionId};

/// A page in the web dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Replay,
    DeviceSettings(DeviceId),
    DeviceCommand(DeviceId),
    DeviceShare(DeviceId),
    GeofenceSettings(GeofenceId),
    PositionDetails(PositionId),
    /// Creation form for a settings collection (e.g. `/settings/device`).
    NewItem(&'static str),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Replay => "/replay".to_owned(),
            Self::DeviceSettings(id) => format!("/settings/device/{id}"),
            Self::DeviceCommand(id) => format!("/settings/device/{id}/command"),
            Self::DeviceShare(id) => format!("/settings/device/{id}/share"),
            Self::GeofenceSettings(id) => format!("/settings/geofence/{id}"),
            Self::PositionDetails(id) => format!("/position/{id}"),
            Self::NewItem(path) => (*path).to_owned(),
        }
    }

    /// Absolute URL of this page on `base`.
    pub fn url(&self, base: &Url) -> Result<Url, url::ParseError> {
        let root = base.as_str().trim_end_matches('/');
        Url::parse(&format!("{root}{}", self.path()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl Serialize for Route {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn paths() {
        assert_eq!(Route::Replay.path(), "/replay");
        assert_eq!(Route::DeviceCommand(DeviceId(42)).path(), "/settings/device/42/command");
        assert_eq!(Route::DeviceShare(DeviceId(42)).path(), "/settings/device/42/share");
        assert_eq!(Route::GeofenceSettings(GeofenceId(7)).path(), "/settings/geofence/7");
        assert_eq!(Route::PositionDetails(PositionId(900)).path(), "/position/900");
    }

    #[test]
    fn url_keeps_base_prefix() {
        let base = Url::parse("https://example.com/traccar/").unwrap();
        assert_eq!(
            Route::Replay.url(&base).unwrap().as_str(),
            "https://example.com/traccar/replay"
        );
    }
}
