//! Persistence robustness tests for the setflow binary.
//!
//! These tests verify that:
//! - Several processes can append to the same logs (file locking)
//! - Corrupted WAL lines are skipped when reading history
//! - A protocol entry written twice by a retry is listed once
//! - A corrupted template is reported, never silently replaced

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::thread;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("setflow"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn drop_set(data_dir: &std::path::Path) {
    cli()
        .arg("run")
        .arg("--data-dir")
        .arg(data_dir)
        .args(["--manual-clock", "--method", "drop-set", "--exercise", "leg_press"])
        .write_stdin("start\nrec 200 10 9\nrec 150 5 9.5\n")
        .assert()
        .success();
}

#[test]
fn test_concurrent_runs_all_logged() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let data_dir = data_dir.clone();
            thread::spawn(move || drop_set(&data_dir))
        })
        .collect();
    for handle in handles {
        handle.join().expect("run thread panicked");
    }

    let log = fs::read_to_string(data_dir.join("wal/protocol_log.wal")).unwrap();
    assert_eq!(log.lines().count(), 4);
    for line in log.lines() {
        let entry: serde_json::Value = serde_json::from_str(line).expect("whole JSON lines");
        assert_eq!(entry["method"], "drop_set");
    }

    let tracked = fs::read_to_string(data_dir.join("wal/tracked_sets.wal")).unwrap();
    assert_eq!(tracked.lines().count(), 4);
}

#[test]
fn test_corrupted_wal_lines_skipped_by_volume() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    drop_set(&data_dir);
    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(data_dir.join("wal/tracked_sets.wal"))
            .unwrap();
        writeln!(file, "{{ invalid json }}").unwrap();
        write!(file, r#"{{"id":"00000000-0000-0000-0000-0000"#).unwrap();
    }

    // 200×10 + 150×5 = 2750 raw, ×1.5 weighted
    cli()
        .arg("volume")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("leg_press"))
        .stdout(predicate::str::contains("total weighted volume: 4125.0"));
}

#[test]
fn test_repeated_protocol_entry_listed_once() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    drop_set(&data_dir);
    let path = data_dir.join("wal/protocol_log.wal");
    let line = fs::read_to_string(&path).unwrap();
    {
        let mut file = fs::OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(line.as_bytes()).unwrap();
    }
    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);

    cli()
        .arg("protocols")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("leg_press").count(1));
}

#[test]
fn test_history_accepts_any_window() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    drop_set(&data_dir);
    let days = i64::MAX.to_string();

    cli()
        .args(["volume", "--days", &days])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("total weighted volume: 4125.0"));

    cli()
        .args(["protocols", "--days", &days])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("drop_set"));
}

#[test]
fn test_volume_with_no_data() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("volume")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No tracked sets"));
}

#[test]
fn test_rollup_without_wal() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}

#[test]
fn test_corrupted_template_is_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    fs::create_dir_all(data_dir.join("templates")).unwrap();
    let path = data_dir.join("templates/default.json");
    fs::write(&path, "{ invalid json }}}}").unwrap();

    cli()
        .args(["template", "add", "back_squat"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse template"));

    assert_eq!(fs::read_to_string(&path).unwrap(), "{ invalid json }}}}");
}
