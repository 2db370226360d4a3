//! Integration tests for the `tracdash` CLI binary.
//!
//! Argument parsing, help, completions and error handling run without a
//! server; the server-backed flows run against a wiremock instance.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command for the `tracdash` binary with env isolation.
///
/// Clears all `TRACDASH_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn tracdash_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("tracdash");
    cmd.env("HOME", "/tmp/tracdash-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/tracdash-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("TRACDASH_PROFILE")
        .env_remove("TRACDASH_URL")
        .env_remove("TRACDASH_EMAIL")
        .env_remove("TRACDASH_PASSWORD")
        .env_remove("TRACDASH_TOKEN")
        .env_remove("TRACDASH_OUTPUT")
        .env_remove("TRACDASH_INSECURE")
        .env_remove("TRACDASH_TIMEOUT");
    cmd
}

/// Command pre-wired to a mock server with a token.
fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = tracdash_cmd();
    cmd.args(["--url", &server.uri(), "--token", "t0k3n"]);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_session(server: &MockServer, administrator: bool) {
    Mock::given(method("GET"))
        .and(path("/api/session"))
        .and(header("authorization", "Bearer t0k3n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "name": "admin",
            "email": "admin@example.com",
            "administrator": administrator,
            "attributes": {}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/server"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "attributes": {} })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 42, "name": "Van", "uniqueId": "X1", "status": "online" },
            { "id": 7, "name": "Boat", "uniqueId": "B7", "status": "offline" }
        ])))
        .with_priority(10)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 900,
            "deviceId": 42,
            "latitude": 52.52,
            "longitude": 13.405,
            "speed": 10.0,
            "course": 90.0,
            "attributes": {}
        }])))
        .mount(server)
        .await;
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = tracdash_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_flag() {
    tracdash_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("devices")
            .and(predicate::str::contains("command"))
            .and(predicate::str::contains("report")),
    );
}

#[test]
fn test_version_flag() {
    tracdash_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tracdash"));
}

#[test]
fn test_completions_zsh() {
    tracdash_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_report_columns_offline() {
    tracdash_cmd()
        .args(["report", "columns", "--output", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("startTime").and(predicate::str::contains("driverName")));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_capability() {
    tracdash_cmd()
        .args(["command", "42", "horn"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("horn"));
}

#[test]
fn test_devices_list_without_server() {
    tracdash_cmd()
        .args(["devices", "list"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No server configured"));
}

#[test]
fn test_unknown_profile() {
    tracdash_cmd()
        .args(["--profile", "nowhere", "devices", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nowhere"));
}

#[test]
fn test_config_show_no_config() {
    tracdash_cmd().args(["config", "show"]).assert().success();
}

// ── Server-backed flows ─────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_plain() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;

    against(&server)
        .args(["devices", "list", "--output", "plain"])
        .assert()
        .success()
        .stdout("7\n42\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_filtered_json() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;

    let output = against(&server)
        .args(["devices", "list", "--status", "online", "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["name"], "Van");
    assert_eq!(listed[0]["position"]["latitude"], 52.52);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_light_command() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;
    Mock::given(method("POST"))
        .and(path("/api/commands/send"))
        .and(body_json(json!({
            "id": 9,
            "attributes": {},
            "deviceId": 42,
            "type": "lightOn",
            "textChannel": false,
            "description": "Light"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    against(&server).args(["command", "Van", "light"]).assert().success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_without_position_disables_controls() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;

    against(&server)
        .args(["status", "Boat", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("LiveMode=false")
                .and(predicate::str::contains("Light=false"))
                .and(predicate::str::contains("Buzzer=false")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_reads_markers() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .and(query_param("id", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"id":42,"liveModetime":null}]"#))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/commands/send"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"[{"type":"buzzerOn"}]"#))
        .mount(&server)
        .await;

    against(&server)
        .args(["status", "42", "--output", "plain"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("LiveMode=true")
                .and(predicate::str::contains("Light=false"))
                .and(predicate::str::contains("Buzzer=true")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_geofence_partial_failure_exit_code() {
    let server = MockServer::start().await;
    mount_session(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/api/geofences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 77,
            "name": "Geofence",
            "area": "CIRCLE (52.52 13.405, 50)"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/permissions"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    against(&server)
        .args(["geofence", "create", "Van"])
        .assert()
        .code(6)
        .stderr(predicate::str::contains("77"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_remove_requires_admin() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;

    against(&server)
        .args(["--yes", "devices", "remove", "Van"])
        .assert()
        .code(5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_trip_report_export_writes_file() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/api/reports/trips"))
        .and(query_param("deviceId", "42"))
        .and(header(
            "accept",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-type",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                )
                .insert_header("content-disposition", "attachment; filename=\"report.xlsx\"")
                .set_body_bytes(vec![0x50_u8, 0x4b, 0x03, 0x04]),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    against(&server)
        .args([
            "report",
            "trips",
            "--device",
            "Van",
            "--from",
            "2024-01-01T00:00:00Z",
            "--to",
            "2024-01-02T00:00:00Z",
            "--export",
            "--out",
        ])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("report.xlsx"));

    let saved = std::fs::read(dir.path().join("report.xlsx")).unwrap();
    assert_eq!(saved, vec![0x50, 0x4b, 0x03, 0x04]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_trip_report_table() {
    let server = MockServer::start().await;
    mount_session(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/api/reports/trips"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json; charset=utf-8")
                .set_body_string(r#"[{"startTime":"2024-01-01T08:00:00Z","distance":1000}]"#),
        )
        .mount(&server)
        .await;

    against(&server)
        .args([
            "report",
            "trips",
            "-d",
            "42",
            "--from",
            "2024-01-01T00:00:00Z",
            "--to",
            "2024-01-02T00:00:00Z",
            "--columns",
            "distance",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.00 km"));
}
