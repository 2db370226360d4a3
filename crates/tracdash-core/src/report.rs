// ── Trip report ──
//
// One request, three outcomes: a JSON body becomes in-memory rows kept
// exactly as received, any other content type becomes a file to save,
// and a response without a content type yields nothing. Column
// definitions pair each trip field with its formatter and default
// visibility.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use tracdash_api::{ApiClient, ReportResponse, TripReportParams};

use crate::error::CoreError;
use crate::format::Formatter;

/// File name used when the server suggests none.
pub const DEFAULT_EXPORT_NAME: &str = "trips.xlsx";

// ── Rows ─────────────────────────────────────────────────────────────

/// One trip as returned by the server, kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TripRow {
    fields: Map<String, Value>,
}

impl TripRow {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The row exactly as parsed.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn start_time(&self) -> Option<&str> {
        self.text("startTime")
    }

    pub fn end_time(&self) -> Option<&str> {
        self.text("endTime")
    }

    /// Meters.
    pub fn distance(&self) -> Option<f64> {
        self.number("distance")
    }

    /// Knots.
    pub fn average_speed(&self) -> Option<f64> {
        self.number("averageSpeed")
    }

    /// Knots.
    pub fn max_speed(&self) -> Option<f64> {
        self.number("maxSpeed")
    }

    /// Milliseconds.
    pub fn duration(&self) -> Option<i64> {
        self.get("duration").and_then(Value::as_i64)
    }

    pub fn driver_name(&self) -> Option<&str> {
        self.text("driverName")
    }

    /// Identity derived from the row's own data.
    ///
    /// Uses device and start/end position ids when present, else the
    /// device and start time, else the row's position in the response.
    pub fn stable_id(&self, index: usize) -> String {
        let int = |k| self.get(k).and_then(Value::as_i64);
        let device = int("deviceId").map_or_else(String::new, |d| d.to_string());
        match (int("startPositionId"), int("endPositionId")) {
            (Some(start), Some(end)) => format!("{device}:{start}:{end}"),
            _ => match self.start_time() {
                Some(start) => format!("{device}:{start}"),
                None => format!("row-{index}"),
            },
        }
    }
}

// ── Outcome ──────────────────────────────────────────────────────────

/// A binary report to hand to the user as a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportFile {
    pub filename: String,
    pub content_type: String,
    pub body: Bytes,
}

impl ReportFile {
    /// Write into `dir` under the suggested file name.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf, CoreError> {
        let path = dir.join(&self.filename);
        self.save_as(&path)?;
        Ok(path)
    }

    pub fn save_as(&self, path: &Path) -> Result<(), CoreError> {
        std::fs::write(path, &self.body)?;
        info!(path = %path.display(), bytes = self.body.len(), "report saved");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportOutcome {
    Rows(Vec<TripRow>),
    Download(ReportFile),
    /// The server sent no content type; nothing to show.
    Nothing,
}

/// Media type without parameters, lowercased.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// `filename` parameter of a `Content-Disposition` header, reduced to
/// its final path component.
pub fn disposition_filename(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| {
            let (name, value) = part.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("filename")
                .then(|| value.trim().trim_matches('"').to_owned())
        })
        .and_then(|name| {
            Path::new(&name)
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
        })
        .filter(|name| !name.is_empty())
}

/// Decide what a successful report response means.
pub fn interpret(response: ReportResponse) -> Result<ReportOutcome, CoreError> {
    let Some(content_type) = response.content_type else {
        debug!("report response without content type");
        return Ok(ReportOutcome::Nothing);
    };

    if essence(&content_type) == "application/json" {
        let value: Value =
            serde_json::from_slice(&response.body).map_err(|e| CoreError::UnexpectedResponse {
                message: format!("trip report is not valid JSON: {e}"),
            })?;
        let Value::Array(items) = value else {
            return Err(CoreError::UnexpectedResponse {
                message: "trip report is not a JSON array".into(),
            });
        };
        let rows = items
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(TripRow::new(fields)),
                other => Err(CoreError::UnexpectedResponse {
                    message: format!("trip row is not an object: {other}"),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(ReportOutcome::Rows(rows));
    }

    let filename = response
        .content_disposition
        .as_deref()
        .and_then(disposition_filename)
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_owned());
    Ok(ReportOutcome::Download(ReportFile {
        filename,
        content_type,
        body: response.body,
    }))
}

/// Request the trips report and interpret the response.
pub async fn fetch_trips(
    client: &ApiClient,
    params: &TripReportParams,
) -> Result<ReportOutcome, CoreError> {
    let response = client.trip_report(params).await?;
    interpret(response)
}

// ── Columns ──────────────────────────────────────────────────────────

/// How a column's raw value is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Date,
    Distance,
    Speed,
    Hours,
    Volume,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripColumn {
    pub field: &'static str,
    pub label_key: &'static str,
    pub kind: ColumnKind,
    pub hidden_by_default: bool,
}

const fn column(
    field: &'static str,
    label_key: &'static str,
    kind: ColumnKind,
    hidden_by_default: bool,
) -> TripColumn {
    TripColumn {
        field,
        label_key,
        kind,
        hidden_by_default,
    }
}

/// Trip report columns in display order.
pub const TRIP_COLUMNS: &[TripColumn] = &[
    column("startTime", "reportStartTime", ColumnKind::Date, false),
    column("startOdometer", "reportStartOdometer", ColumnKind::Distance, false),
    column("startAddress", "reportStartAddress", ColumnKind::Text, true),
    column("endTime", "reportEndTime", ColumnKind::Date, false),
    column("endOdometer", "reportEndOdometer", ColumnKind::Distance, false),
    column("endAddress", "reportEndAddress", ColumnKind::Text, true),
    column("distance", "sharedDistance", ColumnKind::Distance, false),
    column("averageSpeed", "reportAverageSpeed", ColumnKind::Speed, false),
    column("maxSpeed", "reportMaximumSpeed", ColumnKind::Speed, false),
    column("duration", "reportDuration", ColumnKind::Hours, false),
    column("spentFuel", "reportSpentFuel", ColumnKind::Volume, true),
    column("driverName", "sharedDriver", ColumnKind::Text, true),
];

impl TripColumn {
    /// Cell text for `row`; empty when the field is missing or null.
    pub fn render(&self, row: &TripRow, fmt: &Formatter) -> String {
        let Some(value) = row.get(self.field) else {
            return String::new();
        };
        let number = value.as_f64();
        match (self.kind, number) {
            (ColumnKind::Distance, Some(n)) => fmt.distance(n),
            (ColumnKind::Speed, Some(n)) => fmt.speed(n),
            (ColumnKind::Volume, Some(n)) => fmt.volume(n),
            (ColumnKind::Hours, Some(n)) => fmt.hours(n),
            (ColumnKind::Date, _) => value.as_str().map_or_else(|| value.to_string(), |s| fmt.date(s)),
            (_, _) => value
                .as_str()
                .map_or_else(|| value.to_string(), str::to_owned),
        }
    }

    pub fn label(&self, fmt: &Formatter) -> String {
        fmt.t(self.label_key)
    }
}

/// Which trip columns are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnVisibility {
    hidden: HashSet<&'static str>,
}

impl Default for ColumnVisibility {
    fn default() -> Self {
        Self {
            hidden: TRIP_COLUMNS
                .iter()
                .filter(|c| c.hidden_by_default)
                .map(|c| c.field)
                .collect(),
        }
    }
}

impl ColumnVisibility {
    /// Show exactly the named fields. Unknown names are ignored.
    pub fn only(fields: &[&str]) -> Self {
        Self {
            hidden: TRIP_COLUMNS
                .iter()
                .filter(|c| !fields.contains(&c.field))
                .map(|c| c.field)
                .collect(),
        }
    }

    /// Every column shown.
    pub fn all() -> Self {
        Self {
            hidden: HashSet::new(),
        }
    }

    pub fn is_visible(&self, field: &str) -> bool {
        !self.hidden.contains(field)
    }

    /// Flip a column. Returns the new visibility, or `None` for an
    /// unknown field.
    pub fn toggle(&mut self, field: &str) -> Option<bool> {
        let column = TRIP_COLUMNS.iter().find(|c| c.field == field)?;
        if self.hidden.remove(column.field) {
            Some(true)
        } else {
            self.hidden.insert(column.field);
            Some(false)
        }
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &'static TripColumn> + '_ {
        TRIP_COLUMNS.iter().filter(|c| self.is_visible(c.field))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::format::DistanceUnit;

    fn response(content_type: Option<&str>, body: &'static [u8]) -> ReportResponse {
        ReportResponse {
            content_type: content_type.map(str::to_owned),
            content_disposition: None,
            body: Bytes::from_static(body),
        }
    }

    fn fmt() -> Formatter {
        Formatter::default().with_offset(FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn json_rows_are_kept_verbatim() {
        let body = br#"[{"startTime":"2024-01-01T08:00:00Z","distance":1000,"extra":{"a":[1,2]}}]"#;
        let outcome = interpret(response(Some("application/json"), body)).unwrap();
        let ReportOutcome::Rows(rows) = outcome else {
            panic!("expected rows, got {outcome:?}");
        };
        let parsed: Value = serde_json::from_slice(body).unwrap();
        let round: Vec<Value> = rows.iter().map(|r| Value::Object(r.fields().clone())).collect();
        assert_eq!(Value::Array(round), parsed);
    }

    #[test]
    fn json_with_charset_parameter_is_json() {
        let outcome = interpret(response(Some("application/json; charset=utf-8"), b"[]")).unwrap();
        assert_eq!(outcome, ReportOutcome::Rows(Vec::new()));
    }

    #[test]
    fn other_content_type_is_download() {
        let mut resp = response(Some("application/vnd.ms-excel"), b"PK\x03\x04");
        resp.content_disposition = Some("attachment; filename=\"../trips-5.xlsx\"".into());
        let ReportOutcome::Download(file) = interpret(resp).unwrap() else {
            panic!("expected download");
        };
        assert_eq!(file.filename, "trips-5.xlsx");
        assert_eq!(file.body.len(), 4);
    }

    #[test]
    fn download_without_disposition_uses_default_name() {
        let ReportOutcome::Download(file) =
            interpret(response(Some("application/octet-stream"), b"x")).unwrap()
        else {
            panic!("expected download");
        };
        assert_eq!(file.filename, DEFAULT_EXPORT_NAME);
    }

    #[test]
    fn missing_content_type_yields_nothing() {
        assert_eq!(interpret(response(None, b"[]")).unwrap(), ReportOutcome::Nothing);
    }

    #[test]
    fn non_array_json_is_an_error() {
        assert!(interpret(response(Some("application/json"), br#"{"a":1}"#)).is_err());
    }

    #[test]
    fn stable_id_prefers_position_ids() {
        let row = TripRow::new(
            json!({ "deviceId": 5, "startPositionId": 10, "endPositionId": 20 })
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert_eq!(row.stable_id(0), "5:10:20");
        assert_eq!(row.stable_id(0), row.stable_id(0));

        let row = TripRow::new(json!({ "startTime": "2024-01-01T08:00:00Z" }).as_object().cloned().unwrap());
        assert_eq!(row.stable_id(3), ":2024-01-01T08:00:00Z");

        let row = TripRow::new(Map::new());
        assert_eq!(row.stable_id(3), "row-3");
    }

    #[test]
    fn distance_column_follows_unit_preference() {
        let row = TripRow::new(json!({ "distance": 1000 }).as_object().cloned().unwrap());
        let distance = TRIP_COLUMNS.iter().find(|c| c.field == "distance").unwrap();
        assert_eq!(distance.render(&row, &fmt()), "1.00 km");

        let miles = Formatter {
            distance_unit: DistanceUnit::Mile,
            ..fmt()
        };
        assert_eq!(distance.render(&row, &miles), "0.62 mi");
    }

    #[test]
    fn column_rendering_by_kind() {
        let row = TripRow::new(
            json!({
                "startTime": "2024-01-01T08:00:00.000+00:00",
                "duration": 5_400_000,
                "maxSpeed": 10.0,
                "driverName": "Ana",
                "spentFuel": null
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let f = fmt();
        let render = |field: &str| {
            TRIP_COLUMNS
                .iter()
                .find(|c| c.field == field)
                .unwrap()
                .render(&row, &f)
        };
        assert_eq!(render("startTime"), "2024-01-01 08:00");
        assert_eq!(render("duration"), "1 h 30 min");
        assert_eq!(render("maxSpeed"), "10.00 kn");
        assert_eq!(render("driverName"), "Ana");
        assert_eq!(render("spentFuel"), "");
    }

    #[test]
    fn fractional_duration_is_rounded() {
        let row = TripRow::new(json!({ "duration": 5_400_000.0 }).as_object().cloned().unwrap());
        let duration = TRIP_COLUMNS.iter().find(|c| c.field == "duration").unwrap();
        assert_eq!(duration.render(&row, &fmt()), "1 h 30 min");

        let row = TripRow::new(json!({ "duration": 3_599_999.7 }).as_object().cloned().unwrap());
        assert_eq!(duration.render(&row, &fmt()), "1 h 0 min");
    }

    #[test]
    fn default_visibility_hides_four_columns() {
        let vis = ColumnVisibility::default();
        let hidden: Vec<_> = TRIP_COLUMNS
            .iter()
            .filter(|c| !vis.is_visible(c.field))
            .map(|c| c.field)
            .collect();
        assert_eq!(hidden, ["startAddress", "endAddress", "spentFuel", "driverName"]);
    }

    #[test]
    fn toggle_flips_and_rejects_unknown() {
        let mut vis = ColumnVisibility::default();
        assert_eq!(vis.toggle("driverName"), Some(true));
        assert!(vis.is_visible("driverName"));
        assert_eq!(vis.toggle("distance"), Some(false));
        assert_eq!(vis.toggle("bogus"), None);
        assert_eq!(ColumnVisibility::only(&["distance"]).visible_columns().count(), 1);
    }

    #[test]
    fn save_in_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = ReportFile {
            filename: DEFAULT_EXPORT_NAME.into(),
            content_type: "application/octet-stream".into(),
            body: Bytes::from_static(b"data"),
        };
        let path = file.save_in(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"data");
    }
}
