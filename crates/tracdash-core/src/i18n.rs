// ── Translation ──
//
// Labels throughout the dashboard are looked up by message key. The
// English table is built in; a JSON catalog (`{"key": "text", ...}`)
// can be layered on top for other locales. Unknown keys fall back to
// the key itself.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::CoreError;

/// Maps message keys to display strings.
pub trait Translate: Send + Sync {
    fn translate<'a>(&'a self, key: &'a str) -> Cow<'a, str>;
}

/// Built-in English messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct English;

impl Translate for English {
    fn translate<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(english(key).unwrap_or(key))
    }
}

/// A message catalog loaded from JSON, backed by [`English`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let entries = serde_json::from_str(json).map_err(|e| CoreError::Config {
            message: format!("invalid translation catalog: {e}"),
        })?;
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Translate for Catalog {
    fn translate<'a>(&'a self, key: &'a str) -> Cow<'a, str> {
        match self.entries.get(key) {
            Some(text) => Cow::Borrowed(text.as_str()),
            None => English.translate(key),
        }
    }
}

fn english(key: &str) -> Option<&'static str> {
    Some(match key {
        // Units
        "sharedKm" => "km",
        "sharedMi" => "mi",
        "sharedNmi" => "nmi",
        "sharedKn" => "kn",
        "sharedKmh" => "km/h",
        "sharedMph" => "mph",
        "sharedLiter" => "l",
        "sharedUsGallon" => "US gal",
        "sharedImpGallon" => "imp. gal",
        "sharedMeter" => "m",
        "sharedHourAbbreviation" => "h",
        "sharedMinuteAbbreviation" => "min",
        // Generic
        "sharedYes" => "Yes",
        "sharedNo" => "No",
        "sharedEdit" => "Edit",
        "sharedRemove" => "Remove",
        "sharedExtra" => "Extra",
        "sharedAdd" => "Add",
        "sharedShowDetails" => "Show Details",
        "sharedNoData" => "No data",
        "sharedLoading" => "Loading...",
        "sharedRemoveConfirm" => "Remove item",
        "reportColumns" => "Columns",
        "sharedGeofence" => "Geofence",
        "sharedGeofences" => "Geofences",
        "sharedCreateGeofence" => "Create Geofence",
        "sharedDistance" => "Distance",
        "sharedDriver" => "Driver",
        "sharedDevice" => "Device",
        "deviceTitle" => "Devices",
        "sharedName" => "Name",
        "deviceIdentifier" => "Identifier",
        "deviceStatus" => "Status",
        "deviceLastUpdate" => "Last Update",
        // Position
        "positionLatitude" => "Latitude",
        "positionLongitude" => "Longitude",
        "positionSpeed" => "Speed",
        "positionCourse" => "Course",
        "positionAltitude" => "Altitude",
        "positionAccuracy" => "Accuracy",
        "positionValid" => "Valid",
        "positionAddress" => "Address",
        "positionDeviceTime" => "Device Time",
        "positionFixTime" => "Fix Time",
        "positionServerTime" => "Server Time",
        "positionProtocol" => "Protocol",
        "positionRaw" => "Raw",
        "positionIndex" => "Index",
        "positionHdop" => "HDOP",
        "positionVdop" => "VDOP",
        "positionPdop" => "PDOP",
        "positionFlags" => "Flags",
        "sharedType" => "Type",
        "positionSat" => "Satellites",
        "positionSatVisible" => "Visible Satellites",
        "positionRssi" => "RSSI",
        "positionGps" => "GPS",
        "positionRoaming" => "Roaming",
        "positionEvent" => "Event",
        "positionAlarm" => "Alarm",
        "positionStatus" => "Status",
        "positionOdometer" => "Odometer",
        "positionServiceOdometer" => "Service Odometer",
        "positionTripOdometer" => "Trip Odometer",
        "positionHours" => "Hours",
        "positionSteps" => "Steps",
        "positionInput" => "Input",
        "positionOutput" => "Output",
        "positionPower" => "Power",
        "positionBattery" => "Battery",
        "positionBatteryLevel" => "Battery Level",
        "positionFuel" => "Fuel",
        "positionFuelConsumption" => "Fuel Consumption",
        "positionVersionFw" => "Firmware Version",
        "positionVersionHw" => "Hardware Version",
        "positionIgnition" => "Ignition",
        "positionCharge" => "Charge",
        "positionIp" => "IP",
        "positionArchive" => "Archive",
        "positionDistance" => "Distance",
        "positionRpm" => "RPM",
        "positionVin" => "VIN",
        "positionApproximate" => "Approximate",
        "positionThrottle" => "Throttle",
        "positionMotion" => "Motion",
        "positionArmed" => "Armed",
        "positionAcceleration" => "Acceleration",
        "positionDeviceTemp" => "Device Temperature",
        "positionObdSpeed" => "OBD Speed",
        "positionObdOdometer" => "OBD Odometer",
        "positionDriverUniqueId" => "Driver Unique ID",
        "positionBlocked" => "Blocked",
        "positionDoor" => "Door",
        "deviceTotalDistance" => "Total Distance",
        // Reports
        "reportTitle" => "Reports",
        "reportTrips" => "Trips",
        "reportStartTime" => "Start Time",
        "reportStartOdometer" => "Odometer Start",
        "reportStartAddress" => "Start Address",
        "reportEndTime" => "End Time",
        "reportEndOdometer" => "Odometer End",
        "reportEndAddress" => "End Address",
        "reportAverageSpeed" => "Average Speed",
        "reportMaximumSpeed" => "Maximum Speed",
        "reportDuration" => "Duration",
        "reportSpentFuel" => "Spent Fuel",
        "reportReplay" => "Replay",
        "reportShow" => "Show",
        "reportExport" => "Export",
        "reportFrom" => "From",
        "reportTo" => "To",
        "reportPeriod" => "Period",
        "reportToday" => "Today",
        "reportYesterday" => "Yesterday",
        "reportThisWeek" => "This Week",
        "reportPreviousWeek" => "Previous Week",
        "reportThisMonth" => "This Month",
        "reportPreviousMonth" => "Previous Month",
        "reportCustom" => "Custom",
        "reportEmail" => "Email Report",
        // Status card
        "liveModeActivate" => "Activate Live Mode",
        "lightActivate" => "Activate Light",
        "buzzerActivate" => "Activate Buzzer",
        "commandTitle" => "Command",
        "deviceShare" => "Share Device",
        "linkGoogleMaps" => "Google Maps",
        "linkAppleMaps" => "Apple Maps",
        "linkStreetView" => "Street View",
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(English.translate("noSuchKey"), "noSuchKey");
        assert_eq!(English.translate("sharedKmh"), "km/h");
    }

    #[test]
    fn catalog_overrides_and_falls_back() {
        let catalog = Catalog::from_json(r#"{"sharedYes": "Ja"}"#).unwrap();
        assert_eq!(catalog.translate("sharedYes"), "Ja");
        assert_eq!(catalog.translate("sharedNo"), "No");
    }

    #[test]
    fn catalog_rejects_non_object() {
        assert!(Catalog::from_json("[1, 2]").is_err());
    }
}
