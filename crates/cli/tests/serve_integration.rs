//! Integration tests for the `chaosboard serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port with a
//! pinned corpus, makes raw HTTP requests, and checks the responses.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use serde_json::Value;
use tempfile::TempDir;

const CONFIG: &str = r#"
[corpus]
seed = 7
runs = 12
scenarios = 8
incidents = 10
anchor = "2026-01-20T14:00:00Z"

[server]
acting_user = "default@example.com"
"#;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so separate test binaries don't
/// collide on the same range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 20000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

/// Running server; killed on drop.
struct Server {
    port: u16,
    child: Child,
    _dir: TempDir,
}

impl Drop for Server {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

fn start_server(env: &[(&str, &str)]) -> Server {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("chaosboard.toml");
    std::fs::write(&config, CONFIG).expect("write config");
    let port = next_port();

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_chaosboard"));
    cmd.current_dir(dir.path())
        .arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--config")
        .arg(&config)
        .env_remove("CHAOSBOARD_API_KEY")
        .env("CHAOSBOARD_RATE_LIMIT", "1000")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    for (key, value) in env {
        cmd.env(key, value);
    }

    let child = cmd.spawn().expect("failed to start chaosboard serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Server {
        port,
        child,
        _dir: dir,
    }
}

/// Raw HTTP/1.1 request. Returns (status, headers, body).
fn http(
    port: u16,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost:{port}\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    let body = body.unwrap_or("");
    if !body.is_empty() {
        request.push_str("Content-Type: application/json\r\n");
    }
    request.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    ));
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    parse_http_response(&response)
}

fn get(port: u16, path: &str) -> (u16, String) {
    let (status, _, body) = http(port, "GET", path, &[], None);
    (status, body)
}

fn post(port: u16, path: &str, headers: &[(&str, &str)], body: Option<&str>) -> (u16, String) {
    let (status, _, body) = http(port, "POST", path, headers, body);
    (status, body)
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON ({e}): {body}"))
}

/// Extract a header value from raw headers string.
fn extract_header<'a>(headers: &'a str, name: &str) -> Option<&'a str> {
    headers.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

fn parse_http_response(response: &str) -> (u16, String, String) {
    let (headers, body) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    let status = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);
    let chunked = extract_header(headers, "transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"));
    let body = if chunked {
        decode_chunked(body)
    } else {
        body.to_string()
    };
    (status, headers.to_string(), body)
}

fn decode_chunked(mut data: &str) -> String {
    let mut result = String::new();
    while let Some(line_end) = data.find("\r\n") {
        let Ok(size) = usize::from_str_radix(data[..line_end].trim(), 16) else {
            break;
        };
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = (start + size).min(data.len());
        result.push_str(&data[start..end]);
        data = data.get(end + 2..).unwrap_or("");
    }
    result
}

fn scenario_form(name: &str) -> String {
    serde_json::json!({
        "name": name,
        "description": "Inject latency into checkout",
        "targetService": "payment-service",
        "environment": "staging",
        "type": "latency",
        "intensity": 40,
        "duration": 120,
        "scheduleType": "manual",
        "maxErrorRate": 5.0,
        "autoStopEnabled": true,
        "steps": [
            {"id": "step-1", "type": "inject_fault", "label": "Inject latency"}
        ]
    })
    .to_string()
}

// -- General --

#[test]
fn health_returns_200() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/health");
    assert_eq!(status, 200);
    let body = json(&body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["seed"], 7);
}

#[test]
fn unknown_route_returns_404() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/nope");
    assert_eq!(status, 404);
    assert_eq!(json(&body)["error"], "not found");
}

#[test]
fn kpis_and_catalog() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/kpis");
    assert_eq!(status, 200);
    assert!(json(&body)["runsToday"].is_u64());

    let (status, body) = get(server.port, "/catalog");
    assert_eq!(status, 200);
    assert!(!json(&body).as_array().unwrap().is_empty());
}

// -- Runs --

#[test]
fn runs_list_and_filters() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/runs");
    assert_eq!(status, 200);
    let page = json(&body);
    assert_eq!(page["totalCount"], 12);
    assert_eq!(page["items"].as_array().unwrap().len(), 10);

    let (status, body) = get(server.port, "/runs?status=failed&page=1");
    assert_eq!(status, 200);
    for run in json(&body)["items"].as_array().unwrap() {
        assert_eq!(run["status"], "failed");
    }

    let (status, body) = get(server.port, "/runs?from=2026-01-20");
    assert_eq!(status, 200);
    for run in json(&body)["items"].as_array().unwrap() {
        assert!(run["startedAt"].as_str().unwrap() >= "2026-01-20");
    }
}

#[test]
fn runs_bad_query_returns_400() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/runs?status=bogus");
    assert_eq!(status, 400);
    assert!(json(&body)["error"].as_str().unwrap().contains("bogus"));

    let (status, _) = get(server.port, "/runs?page=abc");
    assert_eq!(status, 400);
}

#[test]
fn run_detail_and_missing_run() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/runs/run-0001");
    assert_eq!(status, 200);
    assert_eq!(json(&body)["id"], "run-0001");

    let (status, body) = get(server.port, "/runs/run-9999");
    assert_eq!(status, 404);
    assert_eq!(json(&body)["error"], "run not found: run-9999");
}

#[test]
fn run_export_supports_etag() {
    let server = start_server(&[]);
    let (status, headers, body) = http(server.port, "GET", "/runs/run-0001/export", &[], None);
    assert_eq!(status, 200);
    assert_eq!(json(&body)["id"], "run-0001");
    assert!(extract_header(&headers, "content-disposition")
        .unwrap()
        .contains("run-0001-export.json"));
    let etag = extract_header(&headers, "etag").unwrap().to_string();

    let (status, _, _) = http(
        server.port,
        "GET",
        "/runs/run-0001/export",
        &[("If-None-Match", etag.as_str())],
        None,
    );
    assert_eq!(status, 304);
}

// -- Incidents --

#[test]
fn incident_acknowledge_then_resolve() {
    let server = start_server(&[]);
    let actor = [("X-Acting-User", "sre@example.com")];

    let (status, body) = post(server.port, "/incidents/inc-0001/acknowledge", &actor, None);
    assert_eq!(status, 200);
    let incident = json(&body);
    assert_eq!(incident["status"], "acknowledged");
    assert_eq!(incident["owner"], "sre@example.com");

    let (status, _) = post(server.port, "/incidents/inc-0001/acknowledge", &actor, None);
    assert_eq!(status, 409);

    let (status, body) = post(server.port, "/incidents/inc-0001/resolve", &[], None);
    assert_eq!(status, 200);
    let incident = json(&body);
    assert_eq!(incident["status"], "resolved");
    assert_eq!(incident["owner"], "sre@example.com");

    let (_, body) = get(server.port, "/incidents/inc-0001");
    assert_eq!(json(&body)["status"], "resolved");
}

#[test]
fn acknowledge_without_header_uses_configured_user() {
    let server = start_server(&[]);
    let (status, body) = post(server.port, "/incidents/inc-0002/acknowledge", &[], None);
    assert_eq!(status, 200);
    assert_eq!(json(&body)["owner"], "default@example.com");
}

#[test]
fn unknown_incident_actions_return_404() {
    let server = start_server(&[]);
    let (status, _) = post(server.port, "/incidents/inc-9999/resolve", &[], None);
    assert_eq!(status, 404);
    let (status, _) = get(server.port, "/incidents/inc-9999/root-cause");
    assert_eq!(status, 404);
}

#[test]
fn incident_listing_stats_and_insights() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/incidents?status=open&severity=all");
    assert_eq!(status, 200);
    for incident in json(&body)["items"].as_array().unwrap() {
        assert_eq!(incident["status"], "open");
    }

    let (status, body) = get(server.port, "/incidents/stats");
    assert_eq!(status, 200);
    assert_eq!(json(&body)["total"], 10);

    let (status, body) = get(server.port, "/incidents/inc-0001/root-cause");
    assert_eq!(status, 200);
    let confidence = json(&body)["confidence"].as_u64().unwrap();
    assert!(confidence <= 100);

    let (status, body) = get(server.port, "/incidents/inc-0001/related-runs");
    assert_eq!(status, 200);
    assert!(json(&body).as_array().unwrap().len() <= 5);
}

// -- Scenarios --

#[test]
fn create_scenario_validates_and_stores() {
    let server = start_server(&[]);
    let headers = [("X-Acting-User", "author@example.com")];

    let (status, body) = post(
        server.port,
        "/scenarios",
        &headers,
        Some(scenario_form("  ").as_str()),
    );
    assert_eq!(status, 422);
    let fields = json(&body)["fields"].as_array().unwrap().clone();
    assert!(fields.iter().any(|f| f["field"] == "name"));

    let (status, body) = post(
        server.port,
        "/scenarios",
        &headers,
        Some(scenario_form("Checkout latency").as_str()),
    );
    assert_eq!(status, 201);
    let created = json(&body);
    assert_eq!(created["owner"], "author@example.com");
    assert_eq!(created["version"], "v1.0.0");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, body) = get(server.port, &format!("/scenarios/{id}"));
    assert_eq!(status, 200);
    assert_eq!(json(&body)["name"], "Checkout latency");
}

#[test]
fn malformed_scenario_body_is_rejected() {
    let server = start_server(&[]);
    let (status, body) = post(server.port, "/scenarios", &[], Some("{not json"));
    assert_eq!(status, 400);
    assert!(json(&body)["error"].is_string());
}

#[test]
fn update_scenario_replaces_fields() {
    let server = start_server(&[]);
    let (status, _, body) = http(
        server.port,
        "PUT",
        "/scenarios/scenario-002",
        &[],
        Some(scenario_form("Renamed scenario").as_str()),
    );
    assert_eq!(status, 200);
    assert_eq!(json(&body)["name"], "Renamed scenario");

    let (status, _, _) = http(
        server.port,
        "PUT",
        "/scenarios/scenario-001",
        &[],
        Some(scenario_form("Archived edit").as_str()),
    );
    assert_eq!(status, 409);
}

#[test]
fn archive_restore_and_duplicate() {
    let server = start_server(&[]);

    // scenario-001 starts archived
    let (status, _) = post(server.port, "/scenarios/scenario-001/archive", &[], None);
    assert_eq!(status, 409);
    let (status, body) = post(server.port, "/scenarios/scenario-001/restore", &[], None);
    assert_eq!(status, 200);
    assert_eq!(json(&body)["status"], "active");

    let (_, original) = get(server.port, "/scenarios/scenario-002");
    let original = json(&original);
    let (status, body) = post(server.port, "/scenarios/scenario-002/duplicate", &[], None);
    assert_eq!(status, 201);
    let copy = json(&body);
    assert_ne!(copy["id"], "scenario-002");
    assert_eq!(
        copy["name"],
        format!("{} (Copy)", original["name"].as_str().unwrap())
    );

    let (_, body) = get(server.port, "/scenarios");
    assert_eq!(json(&body)["items"][0]["id"], copy["id"]);
}

#[test]
fn scenario_history() {
    let server = start_server(&[]);
    let (status, body) = get(server.port, "/scenarios/scenario-002/versions");
    assert_eq!(status, 200);
    let versions = json(&body);
    let current = versions
        .as_array()
        .unwrap()
        .iter()
        .filter(|v| v["isCurrent"] == true)
        .count();
    assert_eq!(current, 1);

    let (status, _) = get(server.port, "/scenarios/scenario-999/runs");
    assert_eq!(status, 404);
}

// -- Auth and rate limiting --

#[test]
fn api_key_required_when_configured() {
    let server = start_server(&[("CHAOSBOARD_API_KEY", "s3cret")]);

    let (status, _) = get(server.port, "/health");
    assert_eq!(status, 200);

    let (status, _) = get(server.port, "/runs");
    assert_eq!(status, 401);

    let (status, _, _) = http(
        server.port,
        "GET",
        "/runs",
        &[("Authorization", "Bearer wrong")],
        None,
    );
    assert_eq!(status, 403);

    let (status, _, _) = http(
        server.port,
        "GET",
        "/runs",
        &[("Authorization", "Bearer s3cret")],
        None,
    );
    assert_eq!(status, 200);

    let (status, _, _) = http(server.port, "GET", "/runs", &[("X-API-Key", "s3cret")], None);
    assert_eq!(status, 200);
}

#[test]
fn rate_limit_returns_429() {
    let server = start_server(&[("CHAOSBOARD_RATE_LIMIT", "2")]);
    // The readiness probe opens a connection without sending a request.
    assert_eq!(get(server.port, "/health").0, 200);
    assert_eq!(get(server.port, "/health").0, 200);
    let (status, body) = get(server.port, "/health");
    assert_eq!(status, 429);
    assert!(json(&body)["retry_after"].as_u64().unwrap() >= 1);
}
