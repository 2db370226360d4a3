// ── Position attribute dictionary ──
//
// Static metadata for telemetry keys: display name, value type and the
// data type that picks a formatter. Names are resolved through the
// translator when the dictionary is built, so one dictionary serves one
// locale.

use indexmap::IndexMap;

use crate::format::{self, Axis, Formatter};
use crate::i18n::Translate;
use crate::model::{FieldSource, FieldValue, Position};

/// Primitive type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    Boolean,
    String,
}

/// Semantic type selecting a unit-aware formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Speed,
    Distance,
    Altitude,
    Percentage,
    Hours,
    Volume,
    Course,
    Latitude,
    Longitude,
    Date,
}

/// Dictionary entry for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: String,
    pub value_type: Option<ValueType>,
    pub data_type: Option<DataType>,
    /// Whether the key names a fixed position field.
    pub property: bool,
}

struct Entry {
    key: &'static str,
    label: &'static str,
    value_type: Option<ValueType>,
    data_type: Option<DataType>,
    property: bool,
}

const fn field(
    key: &'static str,
    label: &'static str,
    value_type: Option<ValueType>,
    data_type: Option<DataType>,
) -> Entry {
    Entry {
        key,
        label,
        value_type,
        data_type,
        property: true,
    }
}

const fn attr(
    key: &'static str,
    label: &'static str,
    value_type: ValueType,
    data_type: Option<DataType>,
) -> Entry {
    Entry {
        key,
        label,
        value_type: Some(value_type),
        data_type,
        property: false,
    }
}

const NUM: ValueType = ValueType::Number;
const BOOL: ValueType = ValueType::Boolean;
const STR: ValueType = ValueType::String;

const ENTRIES: &[Entry] = &[
    field("latitude", "positionLatitude", Some(NUM), Some(DataType::Latitude)),
    field("longitude", "positionLongitude", Some(NUM), Some(DataType::Longitude)),
    field("speed", "positionSpeed", Some(NUM), Some(DataType::Speed)),
    field("course", "positionCourse", Some(NUM), Some(DataType::Course)),
    field("altitude", "positionAltitude", Some(NUM), Some(DataType::Altitude)),
    field("accuracy", "positionAccuracy", Some(NUM), Some(DataType::Distance)),
    field("valid", "positionValid", Some(BOOL), None),
    field("protocol", "positionProtocol", Some(STR), None),
    field("address", "positionAddress", Some(STR), None),
    field("deviceTime", "positionDeviceTime", Some(STR), Some(DataType::Date)),
    field("fixTime", "positionFixTime", Some(STR), Some(DataType::Date)),
    field("serverTime", "positionServerTime", Some(STR), Some(DataType::Date)),
    field("geofenceIds", "sharedGeofences", None, None),
    attr("raw", "positionRaw", STR, None),
    attr("index", "positionIndex", NUM, None),
    attr("hdop", "positionHdop", NUM, None),
    attr("vdop", "positionVdop", NUM, None),
    attr("pdop", "positionPdop", NUM, None),
    attr("sat", "positionSat", NUM, None),
    attr("satVisible", "positionSatVisible", NUM, None),
    attr("rssi", "positionRssi", NUM, None),
    attr("gps", "positionGps", NUM, None),
    attr("roaming", "positionRoaming", BOOL, None),
    attr("event", "positionEvent", STR, None),
    attr("alarm", "positionAlarm", STR, None),
    attr("status", "positionStatus", STR, None),
    attr("odometer", "positionOdometer", NUM, Some(DataType::Distance)),
    attr("serviceOdometer", "positionServiceOdometer", NUM, Some(DataType::Distance)),
    attr("tripOdometer", "positionTripOdometer", NUM, Some(DataType::Distance)),
    attr("hours", "positionHours", NUM, Some(DataType::Hours)),
    attr("steps", "positionSteps", NUM, None),
    attr("input", "positionInput", STR, None),
    attr("output", "positionOutput", STR, None),
    attr("power", "positionPower", NUM, None),
    attr("battery", "positionBattery", NUM, None),
    attr("batteryLevel", "positionBatteryLevel", NUM, Some(DataType::Percentage)),
    attr("fuel", "positionFuel", NUM, Some(DataType::Volume)),
    attr("fuelConsumption", "positionFuelConsumption", NUM, None),
    attr("versionFw", "positionVersionFw", STR, None),
    attr("versionHw", "positionVersionHw", STR, None),
    attr("type", "sharedType", STR, None),
    attr("ignition", "positionIgnition", BOOL, None),
    attr("flags", "positionFlags", STR, None),
    attr("charge", "positionCharge", BOOL, None),
    attr("ip", "positionIp", STR, None),
    attr("archive", "positionArchive", BOOL, None),
    attr("distance", "positionDistance", NUM, Some(DataType::Distance)),
    attr("totalDistance", "deviceTotalDistance", NUM, Some(DataType::Distance)),
    attr("rpm", "positionRpm", NUM, None),
    attr("vin", "positionVin", STR, None),
    attr("approximate", "positionApproximate", BOOL, None),
    attr("throttle", "positionThrottle", NUM, None),
    attr("motion", "positionMotion", BOOL, None),
    attr("armed", "positionArmed", NUM, None),
    attr("geofence", "sharedGeofence", STR, None),
    attr("acceleration", "positionAcceleration", NUM, None),
    attr("deviceTemp", "positionDeviceTemp", NUM, None),
    attr("obdSpeed", "positionObdSpeed", NUM, Some(DataType::Speed)),
    attr("obdOdometer", "positionObdOdometer", NUM, Some(DataType::Distance)),
    attr("driverUniqueId", "positionDriverUniqueId", STR, None),
    attr("blocked", "positionBlocked", BOOL, None),
    attr("door", "positionDoor", BOOL, None),
];

/// Key → metadata, in display order.
#[derive(Debug, Clone)]
pub struct AttributeDictionary {
    entries: IndexMap<&'static str, AttributeInfo>,
}

impl AttributeDictionary {
    /// Build the position dictionary with names from `t`.
    pub fn positions(t: &dyn Translate) -> Self {
        let entries = ENTRIES
            .iter()
            .map(|e| {
                (
                    e.key,
                    AttributeInfo {
                        name: t.translate(e.label).into_owned(),
                        value_type: e.value_type,
                        data_type: e.data_type,
                        property: e.property,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeInfo> {
        self.entries.get(key)
    }

    /// Display name for `key`, falling back to the key itself.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map_or(key, |info| info.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttributeInfo)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render a looked-up position value for display.
    ///
    /// Dispatches on the dictionary's data type first, then on the
    /// runtime shape of the value.
    pub fn render(&self, key: &str, value: &FieldValue, fmt: &Formatter) -> String {
        let data_type = self.get(key).and_then(|i| i.data_type);
        render_value(data_type, value, fmt)
    }

    /// Every resolvable key on `position`, rendered: fixed fields in
    /// dictionary order, then attributes in server order.
    pub fn describe(&self, position: &Position, fmt: &Formatter) -> Vec<(String, String)> {
        let fixed = self
            .iter()
            .filter(|(_, info)| info.property)
            .filter_map(|(key, info)| {
                let (_, value) = position.lookup(key)?;
                Some((info.name.clone(), self.render(key, &value, fmt)))
            });
        let attributes = position.attributes.keys().filter_map(|key| {
            let (source, value) = position.lookup(key)?;
            (source == FieldSource::Attribute)
                .then(|| (self.label(key).to_owned(), self.render(key, &value, fmt)))
        });
        fixed.chain(attributes).collect()
    }
}

fn render_value(data_type: Option<DataType>, value: &FieldValue, fmt: &Formatter) -> String {
    if let (Some(data_type), Some(n)) = (data_type, value.as_f64()) {
        return match data_type {
            DataType::Speed => fmt.speed(n),
            DataType::Distance => fmt.distance(n),
            DataType::Altitude => format::format_altitude(n, fmt.translator()),
            DataType::Percentage => format::format_percentage(n),
            DataType::Hours => fmt.hours(n),
            DataType::Volume => fmt.volume(n),
            DataType::Course => format::format_course(n).to_owned(),
            DataType::Latitude => fmt.coordinate(n, Axis::Latitude),
            DataType::Longitude => fmt.coordinate(n, Axis::Longitude),
            DataType::Date => format::format_number(n, 2),
        };
    }
    match value {
        FieldValue::Empty => String::new(),
        FieldValue::Bool(b) => fmt.boolean(*b),
        FieldValue::Number(n) => format::format_number(*n, 2),
        FieldValue::Integer(n) => n.to_string(),
        FieldValue::Text(s) if data_type == Some(DataType::Date) => fmt.date(s),
        FieldValue::Text(s) => s.clone(),
        FieldValue::Time(t) => format::format_datetime(t, &fmt.offset),
        FieldValue::Ids(ids) => ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
        FieldValue::Json(v) => v.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::i18n::English;
    use crate::model::position::tests::sample;
    use chrono::FixedOffset;

    fn fmt() -> Formatter {
        Formatter::default().with_offset(FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn labels_translate_and_fall_back() {
        let dict = AttributeDictionary::positions(&English);
        assert_eq!(dict.label("batteryLevel"), "Battery Level");
        assert_eq!(dict.label("customSensor"), "customSensor");
    }

    #[test]
    fn render_dispatches_on_data_type() {
        let dict = AttributeDictionary::positions(&English);
        let f = fmt();
        assert_eq!(dict.render("speed", &FieldValue::Number(10.0), &f), "10.00 kn");
        assert_eq!(dict.render("totalDistance", &FieldValue::Number(1000.0), &f), "1.00 km");
        assert_eq!(dict.render("batteryLevel", &FieldValue::Integer(80), &f), "80%");
        assert_eq!(dict.render("valid", &FieldValue::Bool(true), &f), "Yes");
        assert_eq!(dict.render("address", &FieldValue::Empty, &f), "");
    }

    #[test]
    fn describe_lists_fixed_fields_then_attributes() {
        let dict = AttributeDictionary::positions(&English);
        let rows = dict.describe(&sample(), &fmt());
        assert_eq!(rows[0].0, "Latitude");
        assert!(rows.iter().any(|(k, v)| k == "Satellites" && v == "9"));
        assert!(rows.iter().any(|(k, v)| k == "Fix Time" && v == "2024-01-01 08:30"));
    }
}
