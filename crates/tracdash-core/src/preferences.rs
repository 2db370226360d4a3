// ── Attribute preferences ──
//
// A preference key resolves through local overrides, then the user's
// attributes, then the server's attributes, then a default.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::warn;

use crate::format::{CoordinateFormat, DistanceUnit, Formatter, SpeedUnit, VolumeUnit};
use crate::model::{Server, User};

/// Rows shown on the status card when nothing else is configured.
pub const DEFAULT_POSITION_ITEMS: &str = "fixTime,address,speed,totalDistance,valid,batteryLevel";

/// A custom navigation app link-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationApp {
    pub title: String,
    /// Template with `{latitude}` / `{longitude}` placeholders.
    pub link: String,
}

/// Resolved preference sources for one session.
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    overrides: BTreeMap<String, String>,
    user: Map<String, Value>,
    server: Map<String, Value>,
}

impl Preferences {
    pub fn new(user: &User, server: &Server, overrides: BTreeMap<String, String>) -> Self {
        Self {
            overrides,
            user: user.attributes.clone(),
            server: server.attributes.clone(),
        }
    }

    /// Raw preference value, or `None` when unset everywhere.
    pub fn attribute_preference(&self, key: &str) -> Option<String> {
        if let Some(v) = self.overrides.get(key) {
            return Some(v.clone());
        }
        [&self.user, &self.server]
            .into_iter()
            .find_map(|attrs| attrs.get(key).and_then(value_to_string))
    }

    /// Preference value or `default`.
    pub fn attribute_preference_or(&self, key: &str, default: &str) -> String {
        self.attribute_preference(key)
            .unwrap_or_else(|| default.to_owned())
    }

    fn parsed<T: FromStr + Default>(&self, key: &str) -> T {
        match self.attribute_preference(key) {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "unrecognised preference value, using default");
                T::default()
            }),
            None => T::default(),
        }
    }

    pub fn distance_unit(&self) -> DistanceUnit {
        self.parsed("distanceUnit")
    }

    pub fn speed_unit(&self) -> SpeedUnit {
        self.parsed("speedUnit")
    }

    pub fn volume_unit(&self) -> VolumeUnit {
        self.parsed("volumeUnit")
    }

    pub fn coordinate_format(&self) -> CoordinateFormat {
        self.parsed("coordinateFormat")
    }

    /// Ordered status card keys from `positionItems`.
    pub fn position_items(&self) -> Vec<String> {
        self.attribute_preference_or("positionItems", DEFAULT_POSITION_ITEMS)
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Custom navigation app, when a title is configured.
    pub fn navigation_app(&self) -> Option<NavigationApp> {
        let title = self
            .attribute_preference("navigationAppTitle")
            .filter(|t| !t.is_empty())?;
        Some(NavigationApp {
            title,
            link: self.attribute_preference_or("navigationAppLink", ""),
        })
    }

    /// A formatter carrying this session's unit preferences.
    pub fn formatter(&self) -> Formatter {
        Formatter {
            distance_unit: self.distance_unit(),
            speed_unit: self.speed_unit(),
            volume_unit: self.volume_unit(),
            coordinate_format: self.coordinate_format(),
            ..Formatter::default()
        }
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_attrs(user: &Value, server: &Value) -> Preferences {
        let user = User {
            attributes: user.as_object().cloned().unwrap_or_default(),
            ..User::default()
        };
        let server = Server {
            attributes: server.as_object().cloned().unwrap_or_default(),
            ..Server::default()
        };
        Preferences::new(&user, &server, BTreeMap::new())
    }

    #[test]
    fn user_beats_server_beats_default() {
        let prefs = with_attrs(&json!({ "speedUnit": "kmh" }), &json!({ "speedUnit": "mph", "distanceUnit": "mi" }));
        assert_eq!(prefs.speed_unit(), SpeedUnit::KilometersPerHour);
        assert_eq!(prefs.distance_unit(), DistanceUnit::Mile);
        assert_eq!(prefs.volume_unit(), VolumeUnit::Liter);
    }

    #[test]
    fn override_beats_user() {
        let user = User {
            attributes: json!({ "distanceUnit": "mi" }).as_object().cloned().unwrap_or_default(),
            ..User::default()
        };
        let overrides = BTreeMap::from([("distanceUnit".to_owned(), "nmi".to_owned())]);
        let prefs = Preferences::new(&user, &Server::default(), overrides);
        assert_eq!(prefs.distance_unit(), DistanceUnit::NauticalMile);
    }

    #[test]
    fn position_items_default_and_custom() {
        let prefs = with_attrs(&json!({}), &json!({}));
        assert_eq!(
            prefs.position_items(),
            ["fixTime", "address", "speed", "totalDistance", "valid", "batteryLevel"]
        );

        let prefs = with_attrs(&json!({ "positionItems": "speed, sat,," }), &json!({}));
        assert_eq!(prefs.position_items(), ["speed", "sat"]);
    }

    #[test]
    fn bad_unit_falls_back_to_default() {
        let prefs = with_attrs(&json!({ "speedUnit": "furlongs" }), &json!({}));
        assert_eq!(prefs.speed_unit(), SpeedUnit::Knots);
    }

    #[test]
    fn navigation_app_requires_title() {
        let prefs = with_attrs(&json!({ "navigationAppLink": "geo:{latitude},{longitude}" }), &json!({}));
        assert!(prefs.navigation_app().is_none());

        let prefs = with_attrs(
            &json!({ "navigationAppLink": "geo:{latitude},{longitude}", "navigationAppTitle": "OsmAnd" }),
            &json!({}),
        );
        assert_eq!(prefs.navigation_app().map(|n| n.title), Some("OsmAnd".to_owned()));
    }
}
