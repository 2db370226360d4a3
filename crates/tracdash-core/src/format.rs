// ── Value formatting ──
//
// Pure conversions from raw server values (meters, knots, liters,
// milliseconds, ISO timestamps) into display strings in the user's
// preferred units. The free functions take their unit and translator
// explicitly; `Formatter` bundles them for call sites that format many
// values with the same preferences.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::i18n::{English, Translate};

/// Display layout used by [`format_date`].
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

// ── Units ────────────────────────────────────────────────────────────

/// Distance unit preference (`distanceUnit`). Values arrive in meters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum DistanceUnit {
    #[default]
    #[strum(serialize = "km")]
    #[serde(rename = "km")]
    Kilometer,
    #[strum(serialize = "mi")]
    #[serde(rename = "mi")]
    Mile,
    #[strum(serialize = "nmi")]
    #[serde(rename = "nmi")]
    NauticalMile,
}

impl DistanceUnit {
    fn from_meters(self, meters: f64) -> f64 {
        match self {
            Self::Kilometer => meters * 0.001,
            Self::Mile => meters * 0.000_621_371,
            Self::NauticalMile => meters * 0.000_539_957,
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            Self::Kilometer => "sharedKm",
            Self::Mile => "sharedMi",
            Self::NauticalMile => "sharedNmi",
        }
    }
}

/// Speed unit preference (`speedUnit`). Values arrive in knots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum SpeedUnit {
    #[default]
    #[strum(serialize = "kn")]
    #[serde(rename = "kn")]
    Knots,
    #[strum(serialize = "kmh")]
    #[serde(rename = "kmh")]
    KilometersPerHour,
    #[strum(serialize = "mph")]
    #[serde(rename = "mph")]
    MilesPerHour,
}

impl SpeedUnit {
    fn from_knots(self, knots: f64) -> f64 {
        match self {
            Self::Knots => knots,
            Self::KilometersPerHour => knots * 1.852,
            Self::MilesPerHour => knots * 1.150_78,
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            Self::Knots => "sharedKn",
            Self::KilometersPerHour => "sharedKmh",
            Self::MilesPerHour => "sharedMph",
        }
    }
}

/// Volume unit preference (`volumeUnit`). Values arrive in liters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum VolumeUnit {
    #[default]
    #[strum(serialize = "ltr")]
    #[serde(rename = "ltr")]
    Liter,
    #[strum(serialize = "usGallon")]
    #[serde(rename = "usGallon")]
    UsGallon,
    #[strum(serialize = "impGallon")]
    #[serde(rename = "impGallon")]
    ImperialGallon,
}

impl VolumeUnit {
    fn from_liters(self, liters: f64) -> f64 {
        match self {
            Self::Liter => liters,
            Self::UsGallon => liters * 0.264_172,
            Self::ImperialGallon => liters * 0.219_969,
        }
    }

    fn label_key(self) -> &'static str {
        match self {
            Self::Liter => "sharedLiter",
            Self::UsGallon => "sharedUsGallon",
            Self::ImperialGallon => "sharedImpGallon",
        }
    }
}

/// Coordinate layout preference (`coordinateFormat`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    /// Decimal degrees.
    #[default]
    Dd,
    /// Degrees and decimal minutes.
    Ddm,
    /// Degrees, minutes and seconds.
    Dms,
}

/// Which axis a coordinate belongs to, for hemisphere letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

// ── Free functions ───────────────────────────────────────────────────

pub fn format_distance(meters: f64, unit: DistanceUnit, t: &dyn Translate) -> String {
    format!(
        "{:.2} {}",
        unit.from_meters(meters),
        t.translate(unit.label_key())
    )
}

pub fn format_speed(knots: f64, unit: SpeedUnit, t: &dyn Translate) -> String {
    format!("{:.2} {}", unit.from_knots(knots), t.translate(unit.label_key()))
}

pub fn format_volume(liters: f64, unit: VolumeUnit, t: &dyn Translate) -> String {
    format!(
        "{:.2} {}",
        unit.from_liters(liters),
        t.translate(unit.label_key())
    )
}

pub fn format_altitude(meters: f64, t: &dyn Translate) -> String {
    format!("{:.2} {}", meters, t.translate("sharedMeter"))
}

/// Milliseconds as `"{h} h {m} min"`.
/// `millis` may be fractional; it is rounded to the nearest millisecond.
pub fn format_hours(millis: f64, t: &dyn Translate) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
    let millis = millis.round() as i64;
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    format!(
        "{hours} {} {minutes} {}",
        t.translate("sharedHourAbbreviation"),
        t.translate("sharedMinuteAbbreviation")
    )
}

pub fn format_percentage(value: f64) -> String {
    format!("{}%", trim_number(value, 2))
}

pub fn format_boolean(value: bool, t: &dyn Translate) -> String {
    t.translate(if value { "sharedYes" } else { "sharedNo" })
        .into_owned()
}

/// Number rounded to `precision` decimals with trailing zeros dropped.
pub fn format_number(value: f64, precision: usize) -> String {
    trim_number(value, precision)
}

/// Course in degrees as one of eight arrows.
pub fn format_course(degrees: f64) -> &'static str {
    const ARROWS: [&str; 8] = ["↑", "↗", "→", "↘", "↓", "↙", "←", "↖"];
    let sector = ((degrees + 22.5) / 45.0).floor().rem_euclid(8.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
    let index = sector as usize;
    ARROWS.get(index).copied().unwrap_or("↑")
}

pub fn format_coordinate(value: f64, axis: Axis, format: CoordinateFormat) -> String {
    match format {
        CoordinateFormat::Dd => format!("{value:.6}°"),
        CoordinateFormat::Ddm | CoordinateFormat::Dms => {
            let hemisphere = match (axis, value < 0.0) {
                (Axis::Latitude, false) => 'N',
                (Axis::Latitude, true) => 'S',
                (Axis::Longitude, false) => 'E',
                (Axis::Longitude, true) => 'W',
            };
            let abs = value.abs();
            let degrees = abs.trunc();
            let minutes = (abs - degrees) * 60.0;
            if format == CoordinateFormat::Ddm {
                format!("{degrees:.0}° {minutes:.4}' {hemisphere}")
            } else {
                let whole = minutes.trunc();
                let seconds = (minutes - whole) * 60.0;
                format!("{degrees:.0}° {whole:.0}' {seconds:.2}\" {hemisphere}")
            }
        }
    }
}

/// ISO-8601 timestamp as local `YYYY-MM-DD HH:MM` in `offset`.
///
/// Unparseable input is returned unchanged.
pub fn format_date(value: &str, offset: &FixedOffset) -> String {
    match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(offset).format(DATE_FORMAT).to_string(),
        Err(_) => value.to_owned(),
    }
}

pub fn format_datetime(value: &DateTime<Utc>, offset: &FixedOffset) -> String {
    value.with_timezone(offset).format(DATE_FORMAT).to_string()
}

fn trim_number(value: f64, precision: usize) -> String {
    let s = format!("{value:.precision$}");
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    } else {
        s
    }
}

// ── Formatter ────────────────────────────────────────────────────────

/// Unit preferences plus a translator and display timezone.
#[derive(Clone)]
pub struct Formatter {
    pub distance_unit: DistanceUnit,
    pub speed_unit: SpeedUnit,
    pub volume_unit: VolumeUnit,
    pub coordinate_format: CoordinateFormat,
    pub offset: FixedOffset,
    pub(crate) translator: Arc<dyn Translate>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            distance_unit: DistanceUnit::default(),
            speed_unit: SpeedUnit::default(),
            volume_unit: VolumeUnit::default(),
            coordinate_format: CoordinateFormat::default(),
            offset: *Local::now().offset(),
            translator: Arc::new(English),
        }
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("distance_unit", &self.distance_unit)
            .field("speed_unit", &self.speed_unit)
            .field("volume_unit", &self.volume_unit)
            .field("coordinate_format", &self.coordinate_format)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl Formatter {
    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = translator;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn translator(&self) -> &dyn Translate {
        self.translator.as_ref()
    }

    /// Translate a message key.
    pub fn t(&self, key: &str) -> String {
        self.translator.translate(key).into_owned()
    }

    pub fn distance(&self, meters: f64) -> String {
        format_distance(meters, self.distance_unit, self.translator())
    }

    pub fn speed(&self, knots: f64) -> String {
        format_speed(knots, self.speed_unit, self.translator())
    }

    pub fn volume(&self, liters: f64) -> String {
        format_volume(liters, self.volume_unit, self.translator())
    }

    pub fn hours(&self, millis: f64) -> String {
        format_hours(millis, self.translator())
    }

    pub fn boolean(&self, value: bool) -> String {
        format_boolean(value, self.translator())
    }

    pub fn date(&self, value: &str) -> String {
        format_date(value, &self.offset)
    }

    pub fn datetime(&self, value: &DateTime<Utc>) -> String {
        format_datetime(value, &self.offset)
    }

    pub fn coordinate(&self, value: f64, axis: Axis) -> String {
        format_coordinate(value, axis, self.coordinate_format)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn distance_in_each_unit() {
        assert_eq!(format_distance(1000.0, DistanceUnit::Kilometer, &English), "1.00 km");
        assert_eq!(format_distance(1609.344, DistanceUnit::Mile, &English), "1.00 mi");
        assert_eq!(format_distance(1852.0, DistanceUnit::NauticalMile, &English), "1.00 nmi");
    }

    #[test]
    fn speed_converts_from_knots() {
        assert_eq!(format_speed(10.0, SpeedUnit::Knots, &English), "10.00 kn");
        assert_eq!(format_speed(10.0, SpeedUnit::KilometersPerHour, &English), "18.52 km/h");
        assert_eq!(format_speed(10.0, SpeedUnit::MilesPerHour, &English), "11.51 mph");
    }

    #[test]
    fn volume_converts_from_liters() {
        assert_eq!(format_volume(10.0, VolumeUnit::UsGallon, &English), "2.64 US gal");
    }

    #[test]
    fn hours_from_milliseconds() {
        assert_eq!(format_hours(5_400_000.0, &English), "1 h 30 min");
        assert_eq!(format_hours(0.0, &English), "0 h 0 min");
        assert_eq!(format_hours(7_199_999.6, &English), "2 h 0 min");
    }

    #[test]
    fn date_renders_in_offset() {
        assert_eq!(format_date("2024-01-01T08:30:00.000+00:00", &utc()), "2024-01-01 08:30");
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(format_date("2024-01-01T08:30:00Z", &cet), "2024-01-01 09:30");
        assert_eq!(format_date("yesterday", &utc()), "yesterday");
    }

    #[test]
    fn course_sectors() {
        assert_eq!(format_course(0.0), "↑");
        assert_eq!(format_course(90.0), "→");
        assert_eq!(format_course(350.0), "↑");
        assert_eq!(format_course(200.0), "↓");
    }

    #[test]
    fn percentage_and_number_trim_zeros() {
        assert_eq!(format_percentage(80.0), "80%");
        assert_eq!(format_number(12.345, 2), "12.35");
        assert_eq!(format_number(3.0, 1), "3");
    }

    #[test]
    fn coordinate_layouts() {
        assert_eq!(
            format_coordinate(52.5, Axis::Latitude, CoordinateFormat::Dd),
            "52.500000°"
        );
        assert_eq!(
            format_coordinate(-13.25, Axis::Longitude, CoordinateFormat::Ddm),
            "13° 15.0000' W"
        );
        assert_eq!(
            format_coordinate(52.5, Axis::Latitude, CoordinateFormat::Dms),
            "52° 30' 0.00\" N"
        );
    }

    #[test]
    fn units_parse_from_preference_strings() {
        assert_eq!("kmh".parse::<SpeedUnit>().unwrap(), SpeedUnit::KilometersPerHour);
        assert_eq!("usGallon".parse::<VolumeUnit>().unwrap(), VolumeUnit::UsGallon);
        assert_eq!(DistanceUnit::NauticalMile.to_string(), "nmi");
    }
}
