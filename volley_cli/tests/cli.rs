use std::{
    net::TcpListener,
    path::Path,
    process::{Command, Output},
};

fn volley(args: &[&str], cwd: &Path) -> Output {
    volley_with_log(args, cwd, "warn")
}

fn volley_with_log(args: &[&str], cwd: &Path, filter: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_volley"))
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", filter)
        .output()
        .unwrap()
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

#[test]
fn missing_argument_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = volley(&[], dir.path());
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn help_exits_0() {
    let dir = tempfile::tempdir().unwrap();
    let out = volley(&["--help"], dir.path());
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn missing_config_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let out = volley(&["nope.json"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("config file not found"));
}

#[test]
fn invalid_config_exits_1_without_creating_db() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "apiUrl": "http://localhost:1", "concurrentRequests": 0 }"#,
    )
    .unwrap();

    let out = volley(&["config.json"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(!dir.path().join("benchmark_results.db").exists());
}

#[test]
fn fatal_error_is_printed_with_logging_off() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.json"),
        r#"{ "apiUrl": "http://localhost:1", "durationSeconds": 0 }"#,
    )
    .unwrap();

    let out = volley_with_log(&["config.json"], dir.path(), "off");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("durationSeconds must be at least 1"));
}

#[test]
fn completed_run_exits_0_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"{{ "apiUrl": "{}", "concurrentRequests": 2, "durationSeconds": 1 }}"#,
        closed_port_url()
    );
    std::fs::write(dir.path().join("config.json"), config).unwrap();

    let out = volley(
        &["config.json", "--db", "run.db", "--csv", "run.csv"],
        dir.path(),
    );
    assert_eq!(out.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("=== Benchmark Summary ==="));
    assert!(stdout.contains("transport error"));
    assert!(dir.path().join("run.db").exists());

    let csv = std::fs::read_to_string(dir.path().join("run.csv")).unwrap();
    assert!(csv.starts_with("Endpoint,LatencyMs,StatusCode,Timestamp\n"));
    assert!(csv.lines().count() > 1);
}

#[test]
fn json_summary() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"{{ "apiUrl": "{}", "concurrentRequests": 1, "durationSeconds": 1 }}"#,
        closed_port_url()
    );
    std::fs::write(dir.path().join("config.json"), config).unwrap();

    let out = volley(&["config.json", "--json"], dir.path());
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains(r#""result": "summary""#));
}
