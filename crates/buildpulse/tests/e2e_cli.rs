use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use serial_test::serial;
use tokio::net::TcpListener;
use tokio::process::Command;

const BUILD_JSON: &str = r#"{
    "build": {
        "job_name": "demo",
        "build_number": 42,
        "result": "SUCCESS",
        "duration_ms": 1000
    },
    "custom_data": {"field_a": 11},
    "custom_data_tags": {"tag_1": "foo"}
}"#;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_buildpulse")
}

#[derive(Clone, Default)]
struct Received {
    bodies: Arc<Mutex<Vec<String>>>,
}

async fn spawn_influx(status: StatusCode) -> (String, Received) {
    let received = Received::default();
    let app = Router::new()
        .route(
            "/write",
            post(move |State(r): State<Received>, body: Bytes| async move {
                r.bodies
                    .lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&body).into_owned());
                status
            }),
        )
        .with_state(received.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), received)
}

fn write_files(dir: &Path, config: &str) -> (PathBuf, PathBuf) {
    let config_path = dir.join("config.toml");
    let build_path = dir.join("build.json");
    std::fs::write(&config_path, config).unwrap();
    std::fs::write(&build_path, BUILD_JSON).unwrap();
    (config_path, build_path)
}

async fn run(args: &[&str], config: &Path) -> Output {
    run_with_env(args, config, &[]).await
}

async fn run_with_env(args: &[&str], config: &Path, env: &[(&str, &str)]) -> Output {
    Command::new(bin())
        .arg("--config")
        .arg(config)
        .args(args)
        .env_clear()
        .env("RUST_LOG", "off")
        .envs(env.iter().copied())
        .output()
        .await
        .unwrap()
}

#[tokio::test]
#[serial]
async fn preview_prints_line_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let (config, build) = write_files(dir.path(), "");

    let out = run(
        &[
            "preview",
            "--build",
            build.to_str().unwrap(),
            "--timestamp",
            "2026-02-01T00:00:00Z",
        ],
        &config,
    )
    .await;
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<_> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("jenkins_data,project_name=demo,project_path=demo,result=SUCCESS "));
    assert!(lines[0].contains("buildnumber=42i"));
    assert!(lines[0].ends_with(" 1769904000000000000"));
    assert!(lines[1].starts_with("jenkins_custom_data,project_name=demo,"));
    assert!(lines[1].contains("tag_1=foo"));
    assert!(lines[1].contains("field_a=11i"));

    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("[buildpulse] Jenkins base data found"));
}

#[tokio::test]
#[serial]
async fn flags_override_environment_and_file() {
    let dir = tempfile::tempdir().unwrap();
    let (config, build) = write_files(
        dir.path(),
        r#"
        custom_prefix = "file"
        measurement_name = "file_builds"
        "#,
    );

    let out = run_with_env(
        &[
            "--prefix",
            "cli",
            "preview",
            "--build",
            build.to_str().unwrap(),
            "--timestamp",
            "2026-02-01T00:00:00Z",
        ],
        &config,
        &[
            ("BUILDPULSE_CUSTOM_PREFIX", "env"),
            ("BUILDPULSE_MEASUREMENT_NAME", "env_builds"),
        ],
    )
    .await;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8(out.stdout).unwrap();
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with("env_builds,project_name=cli_demo,"), "{first}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn publish_writes_batch_and_skips_broken_target() {
    let (url, received) = spawn_influx(StatusCode::NO_CONTENT).await;
    let dir = tempfile::tempdir().unwrap();
    let (config, build) = write_files(
        dir.path(),
        &format!(
            r#"
            [[targets]]
            description = "broken"
            url = "not a url"
            database = "jenkins"

            [[targets]]
            description = "local"
            url = "{url}"
            database = "jenkins"
            "#
        ),
    );

    let out = run(
        &[
            "--prefix",
            "ci",
            "publish",
            "--build",
            build.to_str().unwrap(),
            "--json",
        ],
        &config,
    )
    .await;
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["points"], 2);
    assert_eq!(summary["written"], serde_json::json!(["local"]));
    assert_eq!(summary["skipped"], serde_json::json!(["broken"]));

    let bodies = received.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0].lines().count(), 2);
    assert!(bodies[0].contains("project_name=ci_demo"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn exposed_failure_exits_non_zero() {
    let (url, _received) = spawn_influx(StatusCode::INTERNAL_SERVER_ERROR).await;
    let dir = tempfile::tempdir().unwrap();
    let (config, build) = write_files(
        dir.path(),
        &format!(
            r#"
            [[targets]]
            description = "strict"
            url = "{url}"
            database = "jenkins"
            expose_exceptions = true
            "#
        ),
    );

    let out = run(&["publish", "--build", build.to_str().unwrap()], &config).await;
    assert!(!out.status.success());
    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("Failed to publish to target 'strict'"));
    assert!(stderr.contains("publish failed"));
}

#[tokio::test]
#[serial]
async fn targets_json_redacts_password() {
    let dir = tempfile::tempdir().unwrap();
    let (config, _) = write_files(
        dir.path(),
        r#"
        [[targets]]
        description = "local"
        url = "http://localhost:8086"
        database = "jenkins"
        username = "ci"
        password = "hunter2"
        "#,
    );

    let out = run(&["targets", "--json"], &config).await;
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("\"description\": \"local\""));
    assert!(!stdout.contains("hunter2"));
}

#[tokio::test]
#[serial]
async fn unknown_target_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (config, build) = write_files(dir.path(), "");

    let out = run(
        &["publish", "--build", build.to_str().unwrap(), "--target", "nope"],
        &config,
    )
    .await;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("no target named 'nope'"));
}
