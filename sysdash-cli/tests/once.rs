use assert_cmd::Command;
use httpmock::prelude::*;

async fn json_mock(server: &MockServer, path: &str, body: &str) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("content-type", "application/json")
                .body(body);
        })
        .await;
}

#[tokio::test]
async fn once_prints_a_full_frame() {
    let server = MockServer::start_async().await;
    json_mock(&server, "/api/cpu", r#"{"percentage":37.5,"cores":8,"frequency":{"current":2400.0}}"#).await;
    json_mock(&server, "/api/ram", r#"{"percentage":61.2,"total":17179869184,"available":6667001856}"#).await;
    json_mock(&server, "/api/disk", r#"{"percentage":48.0,"total":512000000000,"free":266240000000}"#).await;
    json_mock(&server, "/api/network", r#"{"upload_speed":1536,"download_speed":0}"#).await;
    json_mock(&server, "/api/system-info", r#"{"uptime_formatted":"3 days, 4:05:06","boot_time":"2024-04-28 06:00:00"}"#).await;
    json_mock(&server, "/api/processes", r#"[{"pid":4242,"name":"postgres","cpu_percent":1.5,"memory_percent":2.5,"status":"running"}]"#).await;
    json_mock(
        &server,
        "/api/alerts",
        r#"[{"id":7,"message":"Disk almost full","severity":"warning","created_at":"2024-05-01 13:45:10"}]"#,
    ).await;
    let settings = tempfile::tempdir().unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("sysdash-cli"))
        .args(["--url", &server.base_url(), "--once", "--no-color"])
        .arg("--settings-dir")
        .arg(settings.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("37.5%"))
        .stdout(predicates::str::contains("16.0 GB total"))
        .stdout(predicates::str::contains("↑ 1.5 KB/s"))
        .stdout(predicates::str::contains("Disk almost full"))
        .stdout(predicates::str::contains("postgres"));
}

#[tokio::test]
async fn once_survives_an_unreachable_server() {
    let settings = tempfile::tempdir().unwrap();
    Command::new(assert_cmd::cargo::cargo_bin!("sysdash-cli"))
        .args(["--url", "http://127.0.0.1:59999", "--once", "--no-color", "--timeout-ms", "500"])
        .arg("--settings-dir")
        .arg(settings.path())
        .assert()
        .success()
        .stdout(predicates::str::contains("System Monitor"));
}

#[test]
fn rejects_a_malformed_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sysdash.toml");
    std::fs::write(&path, "base_url = [").unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("sysdash-cli"))
        .arg("--config")
        .arg(&path)
        .arg("--once")
        .assert()
        .failure();
}
