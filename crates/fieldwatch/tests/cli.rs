#![cfg(unix)]

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

const CONFIG_INVALID: i32 = 78;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/fieldwatch-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn write_config(tag: &str, body: &str) -> PathBuf {
    let path = unique_temp_dir(tag).join("fieldwatch.yaml");
    std::fs::write(&path, body).expect("config should be writable");
    path
}

fn fieldwatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fieldwatch"));
    cmd.env_remove("FIELDWATCH_CONFIG").env_remove("RUST_LOG");
    cmd
}

const VALID: &str = r#"
serial:
  device: /dev/fieldwatch-test-missing-tty
  baud: 9600
  reconnect_backoff_ms: 50
smtp:
  host: 127.0.0.1
  port: 2525
  user: ops@example.com
  password: secret
  from: fieldwatch@example.com
  starttls: false
"#;

#[test]
fn missing_config_file_is_config_invalid() {
    let output = fieldwatch()
        .arg("/tmp/fieldwatch-definitely-missing.yaml")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(CONFIG_INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fieldwatch-definitely-missing.yaml"), "{stderr}");
}

#[test]
fn malformed_yaml_is_config_invalid() {
    let path = write_config("malformed", "serial: [unterminated\n");
    let output = fieldwatch().arg(&path).output().expect("binary should run");
    assert_eq!(output.status.code(), Some(CONFIG_INVALID));
}

#[test]
fn heartbeat_tag_that_also_alerts_is_rejected() {
    let body = format!("{VALID}protocol:\n  heartbeat_tag: H\n  alerts:\n    H: alarm raised\n");
    let path = write_config("conflict", &body);
    let output = fieldwatch().arg(&path).output().expect("binary should run");

    assert_eq!(output.status.code(), Some(CONFIG_INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("heartbeat"), "{stderr}");
}

#[test]
fn heartbeat_override_clashing_with_default_alerts_is_rejected() {
    let body = format!("{VALID}protocol:\n  heartbeat_tag: A\n");
    let path = write_config("shadow", &body);
    let output = fieldwatch().arg(&path).output().expect("binary should run");

    assert_eq!(output.status.code(), Some(CONFIG_INVALID));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot be both heartbeat and alert"), "{stderr}");
}

#[test]
fn config_argument_is_required() {
    let output = fieldwatch().output().expect("binary should run");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn prints_version() {
    let output = fieldwatch()
        .arg("--version")
        .output()
        .expect("binary should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")), "{stdout}");
}

#[test]
fn absent_device_keeps_retrying() {
    let path = write_config("retry", VALID);
    let mut child = fieldwatch()
        .arg(&path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("binary should spawn");

    thread::sleep(Duration::from_millis(400));
    let still_running = child.try_wait().expect("status should be readable").is_none();
    child.kill().expect("child should be killable");
    let _ = child.wait();

    let mut stderr = String::new();
    child
        .stderr
        .take()
        .expect("stderr should be piped")
        .read_to_string(&mut stderr)
        .expect("stderr should be readable");

    assert!(still_running, "supervisor exited early: {stderr}");
    assert!(stderr.contains("link acquisition failed"), "{stderr}");
}
