#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use chrono::{TimeZone, Utc};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tracdash_api::models::{CommandRequest, DeviceGeofenceLink, NewGeofence};
use tracdash_api::{
    ApiClient, Credentials, Error, ReportFormat, TransportConfig, TripReportParams,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn trip_params(format: ReportFormat) -> TripReportParams {
    TripReportParams {
        device_id: 5,
        from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        to: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        mail: false,
        format,
    }
}

// ── Session ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_login_posts_form_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .and(body_string_contains("email=admin%40example.com"))
        .and(body_string_contains("password=hunter2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "admin",
            "email": "admin@example.com",
            "administrator": true
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let user = client.login("admin@example.com", &secret).await.unwrap();

    assert_eq!(user.id, 1);
    assert!(user.administrator);
}

#[tokio::test]
async fn test_login_rejected_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("admin@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_token_credentials_send_bearer_header() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let credentials = Credentials::Token {
        token: "abc123".to_string().into(),
    };
    let client = ApiClient::new(base_url, &credentials, &TransportConfig::default()).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/session"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 7,
            "temporary": true
        })))
        .mount(&server)
        .await;

    let user = client.current_user().await.unwrap();
    assert_eq!(user.id, 7);
    assert!(user.temporary);
}

#[tokio::test]
async fn test_server_attributes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "readonly": false,
            "deviceReadonly": true,
            "attributes": { "speedUnit": "kmh" }
        })))
        .mount(&server)
        .await;

    let srv = client.server().await.unwrap();
    assert!(srv.device_readonly);
    assert_eq!(srv.attributes["speedUnit"], "kmh");
}

// ── Devices / positions ─────────────────────────────────────────────

#[tokio::test]
async fn test_device_status_body_is_returned_verbatim() {
    let (server, client) = setup().await;

    let raw = r#"[{"id":42,"name":"Van","uniqueId":"X1","liveModetime":null}]"#;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(raw))
        .mount(&server)
        .await;

    let body = client.device_status_body(42).await.unwrap();
    assert_eq!(body, raw);
}

#[tokio::test]
async fn test_list_devices_and_positions() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 42,
            "name": "Van",
            "uniqueId": "X1",
            "status": "online",
            "positionId": 900,
            "attributes": { "deviceImage": "van.png" }
        }])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 900,
            "deviceId": 42,
            "latitude": 52.52,
            "longitude": 13.405,
            "speed": 10.0,
            "valid": true,
            "attributes": { "batteryLevel": 80 }
        }])))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].position_id, Some(900));
    assert_eq!(devices[0].attributes["deviceImage"], "van.png");

    let positions = client.latest_positions().await.unwrap();
    assert_eq!(positions[0].device_id, 42);
    assert_eq!(positions[0].attributes["batteryLevel"], 80);
}

#[tokio::test]
async fn test_delete_device() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/devices/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_device(42).await.unwrap();
}

#[tokio::test]
async fn test_not_found_maps_to_http_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Object does not exist"))
        .mount(&server)
        .await;

    let err = client.position(1).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.status(), Some(404));
}

#[test]
fn test_media_url_escapes_segments() {
    let client = ApiClient::with_client(
        reqwest::Client::new(),
        Url::parse("https://track.example.com").unwrap(),
    );
    let url = client.media_url("dev 1", "van.png").unwrap();
    assert_eq!(
        url.as_str(),
        "https://track.example.com/api/media/dev%201/van.png"
    );
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_send_command_posts_exact_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/commands/send"))
        .and(body_json(json!({
            "id": 7,
            "attributes": {},
            "deviceId": 42,
            "type": "buzzerOn",
            "textChannel": false,
            "description": "Buzzer An"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let cmd = CommandRequest {
        id: 7,
        attributes: serde_json::Map::new(),
        device_id: 42,
        command_type: "buzzerOn".into(),
        text_channel: false,
        description: "Buzzer An".into(),
    };
    client.send_command(&cmd).await.unwrap();
}

#[tokio::test]
async fn test_command_history_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/commands/send"))
        .and(query_param("deviceId", "42"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client.command_history_body(42).await.unwrap_err();
    assert!(
        matches!(&err, Error::Http { status: 500, message } if message == "boom"),
        "unexpected error: {err:?}"
    );
}

// ── Reports ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_trip_report_json_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/trips"))
        .and(query_param("deviceId", "5"))
        .and(query_param("from", "2024-01-01T00:00:00Z"))
        .and(query_param("to", "2024-01-02T00:00:00Z"))
        .and(query_param("mail", "false"))
        .and(header("accept", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string(r#"[{"startTime":"2024-01-01T08:00:00Z","distance":1000}]"#),
        )
        .mount(&server)
        .await;

    let resp = client
        .trip_report(&trip_params(ReportFormat::Json))
        .await
        .unwrap();
    assert_eq!(resp.content_type.as_deref(), Some("application/json"));
    assert!(resp.body.starts_with(b"[{"));
}

#[tokio::test]
async fn test_trip_report_excel_keeps_disposition() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/reports/trips"))
        .and(header("accept", tracdash_api::EXCEL_MEDIA_TYPE))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", tracdash_api::EXCEL_MEDIA_TYPE)
                .insert_header("content-disposition", "attachment; filename=report.xlsx")
                .set_body_bytes(vec![0x50, 0x4b, 0x03, 0x04]),
        )
        .mount(&server)
        .await;

    let resp = client
        .trip_report(&trip_params(ReportFormat::Excel))
        .await
        .unwrap();
    assert_eq!(
        resp.content_disposition.as_deref(),
        Some("attachment; filename=report.xlsx")
    );
    assert_eq!(resp.body.len(), 4);
}

// ── Geofences ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_and_link_geofence() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/geofences"))
        .and(body_json(json!({
            "name": "Geofence 42",
            "area": "CIRCLE (52.52 13.405, 50)"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77,
            "name": "Geofence 42",
            "area": "CIRCLE (52.52 13.405, 50)"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/permissions"))
        .and(body_json(json!({ "deviceId": 42, "geofenceId": 77 })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let geofence = client
        .create_geofence(&NewGeofence {
            name: "Geofence 42".into(),
            area: "CIRCLE (52.52 13.405, 50)".into(),
        })
        .await
        .unwrap();
    assert_eq!(geofence.id, 77);

    client
        .link_geofence(DeviceGeofenceLink {
            device_id: 42,
            geofence_id: geofence.id,
        })
        .await
        .unwrap();
}
