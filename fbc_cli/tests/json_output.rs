use assert_cmd::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const CFG: &str = r#"
[controller]
neg_deadband = -15
pos_deadband = 15
tolerance = 5
confidence = 3

[strategy]
kind = "pidmod"
kp = 0.5

[runner]
tick_ms = 1
"#;

fn last_json_line(bytes: &[u8]) -> serde_json::Value {
    let s = String::from_utf8_lossy(bytes);
    let line = s
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or_else(|| panic!("no output"));
    serde_json::from_str(line).unwrap_or_else(|e| panic!("not JSON ({e}): {line}"))
}

#[test]
fn success_report_is_json() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, CFG).unwrap();
    let out = Command::cargo_bin("fbc")
        .unwrap()
        .args(["--json", "--config"])
        .arg(&cfg)
        .args(["run", "--goal", "80"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let v = last_json_line(&out.stdout);
    assert_eq!(v["status"], "confident");
    assert_eq!(v["completed"], true);
    assert_eq!(v["goal"], 80);
    assert_eq!(v["mode"], "completion");
    assert_eq!(v["strategy"], "pidmod");
    let pos = v["position"].as_i64().unwrap();
    assert!((pos - 80).abs() < 5, "{pos}");
}

#[test]
fn timeout_error_is_json_on_stderr() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, CFG).unwrap();
    let out = Command::cargo_bin("fbc")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .args(["run", "--goal", "500", "--timeout-ms", "3"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    let v = last_json_line(&out.stderr);
    assert_eq!(v["reason"], "Timeout");
    assert_eq!(v["details"]["timeout_ms"], 3);
}
