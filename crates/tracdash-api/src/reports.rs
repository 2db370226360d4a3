// Report endpoints
//
// The trips report answers either with JSON rows or a spreadsheet,
// depending on the `Accept` header sent. The client hands back the raw
// response parts; deciding between rows and a download happens upstream.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{
    ACCEPT, CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;

/// Media type requested for a spreadsheet export.
pub const EXCEL_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// What the caller asks the report endpoint to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// In-memory rows (`Accept: application/json`).
    #[default]
    Json,
    /// Spreadsheet download.
    Excel,
}

impl ReportFormat {
    fn accept(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Excel => EXCEL_MEDIA_TYPE,
        }
    }
}

/// Query for `GET /api/reports/trips`.
#[derive(Debug, Clone)]
pub struct TripReportParams {
    pub device_id: i64,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Ask the server to e-mail the report instead of returning it.
    pub mail: bool,
    pub format: ReportFormat,
}

impl TripReportParams {
    /// Query pairs in the order the server documents them.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("deviceId", self.device_id.to_string()),
            ("from", self.from.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("to", self.to.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("mail", self.mail.to_string()),
        ]
    }
}

/// Raw parts of a successful report response.
#[derive(Debug, Clone)]
pub struct ReportResponse {
    /// `Content-Type` header, verbatim. `None` when the server sent none.
    pub content_type: Option<String>,
    /// `Content-Disposition` header, verbatim.
    pub content_disposition: Option<String>,
    pub body: Bytes,
}

impl ApiClient {
    /// Fetch the trips report.
    ///
    /// `GET /api/reports/trips?deviceId&from&to&mail`
    pub async fn trip_report(&self, params: &TripReportParams) -> Result<ReportResponse, Error> {
        debug!(
            device_id = params.device_id,
            format = ?params.format,
            "requesting trips report"
        );

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(params.format.accept()));

        let resp = self
            .get_response("reports/trips", &params.query(), headers)
            .await?;

        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        };
        let content_type = header(CONTENT_TYPE);
        let content_disposition = header(CONTENT_DISPOSITION);
        let body = resp.bytes().await?;

        Ok(ReportResponse {
            content_type,
            content_disposition,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn query_serializes_utc_instants_with_z_suffix() {
        let params = TripReportParams {
            device_id: 5,
            from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            mail: false,
            format: ReportFormat::Json,
        };
        assert_eq!(
            params.query(),
            vec![
                ("deviceId", "5".to_owned()),
                ("from", "2024-01-01T00:00:00Z".to_owned()),
                ("to", "2024-01-02T00:00:00Z".to_owned()),
                ("mail", "false".to_owned()),
            ]
        );
    }
}
